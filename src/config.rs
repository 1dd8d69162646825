use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants;
use crate::error::{PipelineError, Result};
use crate::normalize::Vocabulary;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub storage: StorageConfig,
    pub crawler: CrawlerConfig,
    pub pipeline: PipelineConfig,
    pub vocabulary: Vocabulary,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub csv_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(constants::DEFAULT_CSV_PATH),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub table_name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(constants::DEFAULT_DATABASE_PATH),
            table_name: constants::DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub listing_path: String,
    pub max_pages: u32,
    pub timeout_seconds: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: constants::TOPCV_BASE_URL.to_string(),
            listing_path: constants::TOPCV_LISTING_PATH.to_string(),
            max_pages: constants::DEFAULT_MAX_PAGES,
            timeout_seconds: 15,
            min_delay_ms: 2000,
            max_delay_ms: 4000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads for batch normalization; 1 runs inline
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

impl Config {
    /// Loads `path` if it exists, otherwise starts from defaults. Environment
    /// overrides are applied last either way.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PipelineError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(constants::ENV_CSV_PATH) {
            if !path.trim().is_empty() {
                self.input.csv_path = PathBuf::from(path);
            }
        }
        if let Ok(path) = std::env::var(constants::ENV_DATABASE_PATH) {
            if !path.trim().is_empty() {
                self.storage.database_path = PathBuf::from(path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.crawler.min_delay_ms > self.crawler.max_delay_ms {
            return Err(PipelineError::Config(format!(
                "crawler.min_delay_ms ({}) exceeds crawler.max_delay_ms ({})",
                self.crawler.min_delay_ms, self.crawler.max_delay_ms
            )));
        }
        let table_ok = !self.storage.table_name.is_empty()
            && self
                .storage
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !table_ok {
            return Err(PipelineError::Config(format!(
                "storage.table_name '{}' must be non-empty ASCII letters, digits or '_'",
                self.storage.table_name
            )));
        }
        self.vocabulary.validate().map_err(PipelineError::Config)?;
        Ok(())
    }
}
