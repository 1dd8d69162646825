use async_trait::async_trait;

use crate::error::Result;
use crate::types::RawRecord;

pub mod csv_file;
pub mod topcv;

pub use csv_file::CsvFileSource;
pub use topcv::{parse_listing_page, TopCvSource};

/// A producer of raw job listings, one record per posting
#[async_trait]
pub trait ListingSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}
