use serde::Serialize;
use tracing::{debug, info, instrument};
use metrics::{counter, histogram};

use crate::normalize::{
    expand, LocationExtractor, RowExpansion, SalaryParser, TitleClassifier, Vocabulary,
};
use crate::types::{NormalizedRow, RawRecord, SalaryUnit};

/// Counters describing one normalized batch
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub records: usize,
    pub rows: usize,
    pub negotiable_salaries: usize,
    pub unknown_salaries: usize,
    pub unknown_locations: usize,
}

impl BatchStats {
    fn merge(&mut self, other: &BatchStats) {
        self.records += other.records;
        self.rows += other.rows;
        self.negotiable_salaries += other.negotiable_salaries;
        self.unknown_salaries += other.unknown_salaries;
        self.unknown_locations += other.unknown_locations;
    }
}

/// Normalized table for a batch, rows in input order
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchOutput {
    pub rows: Vec<NormalizedRow>,
    pub stats: BatchStats,
}

/// Runs salary, title and location normalization over raw records and
/// explodes each record into one row per location pair.
///
/// Stateless per record: one instance can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct NormalizationPipeline {
    salary: SalaryParser,
    titles: TitleClassifier,
    locations: LocationExtractor,
}

impl NormalizationPipeline {
    pub fn new(vocabulary: &Vocabulary) -> Self {
        Self {
            salary: SalaryParser::new(vocabulary),
            titles: TitleClassifier::new(vocabulary),
            locations: LocationExtractor::new(vocabulary),
        }
    }

    /// Normalizes a single record into its lazy row expansion
    pub fn normalize_record<'a>(&self, record: &'a RawRecord) -> RowExpansion<'a> {
        let salary = self.salary.parse(record.salary.as_deref());
        let category = self.titles.classify(record.job_title.as_deref());
        let locations = self.locations.extract(record.address.as_deref());
        expand(record, category, salary, locations)
    }

    fn run_chunk(&self, records: &[RawRecord]) -> BatchOutput {
        let mut output = BatchOutput::default();
        for record in records {
            let expansion = self.normalize_record(record);
            output.stats.records += 1;
            output.stats.rows += expansion.len();

            let start = output.rows.len();
            output.rows.extend(expansion);
            // all rows of a record share salary and title, so the first is representative
            if let Some(first) = output.rows.get(start) {
                match first.salary_unit {
                    SalaryUnit::Negotiable => output.stats.negotiable_salaries += 1,
                    SalaryUnit::Unknown => {
                        output.stats.unknown_salaries += 1;
                        debug!(link = %record.external_link, salary = ?record.salary, "salary not recognised");
                    }
                    _ => {}
                }
                if first.city == crate::constants::UNKNOWN_CITY && first.district.is_none() {
                    output.stats.unknown_locations += 1;
                    debug!(link = %record.external_link, address = ?record.address, "address not recognised");
                }
            }
        }
        output
    }

    /// Normalizes a batch on the current thread
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn run(&self, records: &[RawRecord]) -> BatchOutput {
        let output = self.run_chunk(records);
        Self::record_metrics(&output.stats);
        info!(
            "Normalized {} records into {} rows ({} negotiable, {} unknown salary, {} unknown location)",
            output.stats.records,
            output.stats.rows,
            output.stats.negotiable_salaries,
            output.stats.unknown_salaries,
            output.stats.unknown_locations
        );
        output
    }

    /// Normalizes a batch on `workers` scoped threads.
    ///
    /// The batch is cut into contiguous chunks and the chunk outputs are
    /// concatenated, so row order matches `run`.
    #[instrument(skip_all, fields(records = records.len(), workers = workers))]
    pub fn run_parallel(&self, records: &[RawRecord], workers: usize) -> BatchOutput {
        let workers = workers.max(1);
        if workers == 1 || records.len() < 2 {
            return self.run(records);
        }
        let chunk_size = records.len().div_ceil(workers);

        let outputs: Vec<BatchOutput> = std::thread::scope(|scope| {
            let handles: Vec<_> = records
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.run_chunk(chunk)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(output) => output,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut merged = BatchOutput::default();
        for output in outputs {
            merged.stats.merge(&output.stats);
            merged.rows.extend(output.rows);
        }
        Self::record_metrics(&merged.stats);
        info!(
            "Normalized {} records into {} rows on {} workers",
            merged.stats.records, merged.stats.rows, workers
        );
        merged
    }

    fn record_metrics(stats: &BatchStats) {
        counter!("jobs_normalize_records_total").increment(stats.records as u64);
        counter!("jobs_normalize_rows_total").increment(stats.rows as u64);
        counter!("jobs_normalize_negotiable_total").increment(stats.negotiable_salaries as u64);
        counter!("jobs_normalize_unknown_salary_total").increment(stats.unknown_salaries as u64);
        counter!("jobs_normalize_unknown_location_total").increment(stats.unknown_locations as u64);
        histogram!("jobs_normalize_batch_size").record(stats.records as f64);
    }
}
