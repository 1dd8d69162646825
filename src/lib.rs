pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod storage;
pub mod types;

pub use error::{PipelineError, Result};
pub use pipeline::{BatchOutput, BatchStats, NormalizationPipeline};
pub use types::{LocationPair, NormalizedRow, RawRecord, SalaryResult, SalaryUnit, TitleCategory};
