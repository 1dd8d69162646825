use async_trait::async_trait;
use std::fs::File;
use std::path::PathBuf;
use tracing::{info, instrument};

use super::ListingSource;
use crate::constants::CSV_SOURCE;
use crate::error::Result;
use crate::types::RawRecord;

/// Reads previously crawled listings from a headered CSV file
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parses CSV text already in memory
    pub fn read_from<R: std::io::Read>(reader: R) -> Result<Vec<RawRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let mut records = Vec::new();
        for row in csv_reader.deserialize::<RawRecord>() {
            records.push(empty_to_none(row?));
        }
        Ok(records)
    }
}

/// Only empty cells are absent; whitespace-only text is kept as written
fn empty_to_none(mut record: RawRecord) -> RawRecord {
    for field in [
        &mut record.job_title,
        &mut record.company,
        &mut record.salary,
        &mut record.address,
    ] {
        if field.as_deref().is_some_and(str::is_empty) {
            *field = None;
        }
    }
    record
}

#[async_trait]
impl ListingSource for CsvFileSource {
    fn source_name(&self) -> &'static str {
        CSV_SOURCE
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let path = self.path.clone();
        let records = tokio::task::spawn_blocking(move || {
            let file = File::open(&path)?;
            Self::read_from(file)
        })
        .await
        .map_err(|e| crate::error::PipelineError::Source {
            source_name: CSV_SOURCE.to_string(),
            message: format!("reader task failed: {}", e),
        })??;
        info!("Loaded {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::io::Write;

    const SAMPLE: &str = "job_title,company,salary,address,link_description\n\
Data Analyst,Acme,10 - 20 triệu,Hà Nội: Cầu Giấy,https://example.com/1\n\
Backend Developer,,Thoả thuận,,https://example.com/2\n";

    #[test]
    fn test_read_from_maps_empty_cells_to_none() {
        let records = CsvFileSource::read_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].job_title.as_deref(), Some("Data Analyst"));
        assert_eq!(records[0].salary.as_deref(), Some("10 - 20 triệu"));
        assert_eq!(records[0].external_link, "https://example.com/1");
        assert_eq!(records[1].company, None);
        assert_eq!(records[1].address, None);
    }

    #[test]
    fn test_whitespace_only_cell_is_kept() {
        let data = "job_title,company,salary,address,link_description\n\"   \",Acme,,,https://example.com/w\n";
        let records = CsvFileSource::read_from(data.as_bytes()).unwrap();
        assert_eq!(records[0].job_title.as_deref(), Some("   "));
        assert_eq!(records[0].salary, None);
        assert_eq!(
            crate::normalize::classify_title(records[0].job_title.as_deref()),
            crate::types::TitleCategory::OtherItRole
        );
    }

    #[test]
    fn test_external_link_header_alias() {
        let data = "job_title,company,salary,address,external_link\nQA,,,,https://example.com/q\n";
        let records = CsvFileSource::read_from(data.as_bytes()).unwrap();
        assert_eq!(records[0].external_link, "https://example.com/q");
        assert_eq!(records[0].salary, None);
    }

    #[tokio::test]
    async fn test_fetch_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let source = CsvFileSource::new(file.path());
        assert_eq!(source.source_name(), "csv");
        let records = source.fetch().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvFileSource::new(dir.path().join("nope.csv"));
        assert!(matches!(source.fetch().await, Err(PipelineError::Io(_))));
    }

    #[test]
    fn test_missing_link_column_is_csv_error() {
        let data = "job_title,company\nDev,Acme\n";
        assert!(matches!(
            CsvFileSource::read_from(data.as_bytes()),
            Err(PipelineError::Csv(_))
        ));
    }
}
