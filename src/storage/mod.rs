use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::NormalizedRow;

pub mod sqlite;

pub use sqlite::SqliteRowStore;

/// Persistence for normalized rows.
///
/// Rows are keyed on their listing link: an upsert replaces every stored
/// row of each link present in the batch, so re-running a batch leaves the
/// store unchanged and keeps one row per location pair.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Returns the number of rows written
    async fn upsert_rows(&self, rows: &[NormalizedRow]) -> Result<usize>;
    async fn all_rows(&self) -> Result<Vec<NormalizedRow>>;
    async fn count(&self) -> Result<usize>;
}

/// In-memory row store for development/testing
#[derive(Default, Clone)]
pub struct InMemoryRowStore {
    rows: Arc<Mutex<Vec<NormalizedRow>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn poisoned<T>(_: std::sync::PoisonError<T>) -> PipelineError {
    PipelineError::Storage("store lock poisoned".to_string())
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn upsert_rows(&self, rows: &[NormalizedRow]) -> Result<usize> {
        let links: HashSet<&str> = rows.iter().map(|r| r.external_link.as_str()).collect();
        let mut stored = self.rows.lock().map_err(poisoned)?;
        let before = stored.len();
        stored.retain(|r| !links.contains(r.external_link.as_str()));
        debug!(
            "Replacing {} stored rows for {} links",
            before - stored.len(),
            links.len()
        );
        stored.extend_from_slice(rows);
        Ok(rows.len())
    }

    async fn all_rows(&self) -> Result<Vec<NormalizedRow>> {
        Ok(self.rows.lock().map_err(poisoned)?.clone())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.rows.lock().map_err(poisoned)?.len())
    }
}
