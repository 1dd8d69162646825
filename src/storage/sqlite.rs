use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

use super::{poisoned, RowStore};
use crate::error::{PipelineError, Result};
use crate::types::{NormalizedRow, SalaryUnit, TitleCategory};

const COLUMNS: &str = "job_title, company, salary, min_salary, max_salary, salary_unit, \
     city, district, standardized_job_title, link_description";

/// SQLite-backed row store.
///
/// Each link's rows carry a `row_index` giving their position in the fan-out;
/// `(link_description, row_index)` is unique.
pub struct SqliteRowStore {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteRowStore {
    pub fn open<P: AsRef<Path>>(path: P, table: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened SQLite store at {}", path.display());
        Self::with_connection(conn, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(PipelineError::Storage(format!("invalid table name '{}'", table)));
        }
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id                      INTEGER PRIMARY KEY AUTOINCREMENT,
                job_title               TEXT,
                company                 TEXT,
                salary                  REAL,
                min_salary              REAL,
                max_salary              REAL,
                salary_unit             TEXT NOT NULL,
                city                    TEXT NOT NULL,
                district                TEXT,
                standardized_job_title  TEXT NOT NULL,
                link_description        TEXT NOT NULL,
                row_index               INTEGER NOT NULL,
                normalized_at           TEXT NOT NULL,
                UNIQUE (link_description, row_index)
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_link ON {table} (link_description);
            "#
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }
}

fn row_from_sql(row: &Row<'_>) -> rusqlite::Result<NormalizedRow> {
    let unit: String = row.get(5)?;
    let category: String = row.get(8)?;
    Ok(NormalizedRow {
        job_title: row.get(0)?,
        company: row.get(1)?,
        salary_average: row.get(2)?,
        salary_min: row.get(3)?,
        salary_max: row.get(4)?,
        salary_unit: SalaryUnit::from_label(&unit),
        city: row.get(6)?,
        district: row.get(7)?,
        category: TitleCategory::from_label(&category),
        external_link: row.get(9)?,
    })
}

#[async_trait]
impl RowStore for SqliteRowStore {
    #[instrument(skip_all, fields(rows = rows.len(), table = %self.table))]
    async fn upsert_rows(&self, rows: &[NormalizedRow]) -> Result<usize> {
        let mut conn = self.conn.lock().map_err(poisoned)?;
        let tx = conn.transaction()?;
        let normalized_at = Utc::now().to_rfc3339();

        // distinct links in first-seen order
        let mut seen: HashSet<&str> = HashSet::new();
        let links: Vec<&str> = rows
            .iter()
            .map(|row| row.external_link.as_str())
            .filter(|link| seen.insert(*link))
            .collect();

        {
            let mut delete = tx.prepare(&format!(
                "DELETE FROM {} WHERE link_description = ?1",
                self.table
            ))?;
            let mut replaced = 0;
            for link in &links {
                replaced += delete.execute(params![link])?;
            }
            debug!("Removed {} previous rows for {} links", replaced, links.len());

            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} ({}, row_index, normalized_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                self.table, COLUMNS
            ))?;
            let mut next_index: HashMap<&str, i64> = HashMap::new();
            for row in rows {
                let index = next_index.entry(row.external_link.as_str()).or_insert(0);
                insert.execute(params![
                    row.job_title,
                    row.company,
                    row.salary_average,
                    row.salary_min,
                    row.salary_max,
                    row.salary_unit.as_str(),
                    row.city,
                    row.district,
                    row.category.as_str(),
                    row.external_link,
                    *index,
                    normalized_at,
                ])?;
                *index += 1;
            }
        }

        tx.commit()?;
        Ok(rows.len())
    }

    async fn all_rows(&self) -> Result<Vec<NormalizedRow>> {
        let conn = self.conn.lock().map_err(poisoned)?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM {} ORDER BY id", COLUMNS, self.table))?;
        let rows = stmt
            .query_map([], row_from_sql)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(poisoned)?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |r| r.get(0))?;
        Ok(count as usize)
    }
}
