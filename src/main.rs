use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, instrument};

use jobs_pipeline::config::Config;
use jobs_pipeline::constants;
use jobs_pipeline::logging;
use jobs_pipeline::pipeline::NormalizationPipeline;
use jobs_pipeline::report::Report;
use jobs_pipeline::sources::{CsvFileSource, ListingSource, TopCvSource};
use jobs_pipeline::storage::{RowStore, SqliteRowStore};

#[derive(Parser)]
#[command(name = "jobs_pipeline")]
#[command(about = "Job listing normalization pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a CSV export and store the rows
    Normalize {
        /// CSV file to read (defaults to input.csv_path)
        #[arg(long)]
        input: Option<PathBuf>,
        /// SQLite database to write (defaults to storage.database_path)
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Crawl TopCV listings, normalize and store them
    Crawl {
        /// Maximum number of listing pages to fetch
        #[arg(long)]
        pages: Option<u32>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Print aggregate statistics over stored rows
    Report {
        #[arg(long)]
        db: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn open_store(config: &Config, db: Option<PathBuf>) -> anyhow::Result<Arc<dyn RowStore>> {
    let path = db.unwrap_or_else(|| config.storage.database_path.clone());
    let store = SqliteRowStore::open(&path, &config.storage.table_name)?;
    Ok(Arc::new(store))
}

#[instrument(skip_all, fields(source = source.source_name()))]
async fn run_source(
    source: &dyn ListingSource,
    config: &Config,
    store: Arc<dyn RowStore>,
) -> anyhow::Result<()> {
    let records = source.fetch().await?;
    info!("Fetched {} records", records.len());

    let pipeline = NormalizationPipeline::new(&config.vocabulary);
    let output = pipeline.run_parallel(&records, config.pipeline.workers);
    let written = store.upsert_rows(&output.rows).await?;
    let total = store.count().await?;

    println!("\n📊 Normalization results for {}:", source.source_name());
    println!("   Records: {}", output.stats.records);
    println!("   Rows: {}", output.stats.rows);
    println!("   Negotiable salaries: {}", output.stats.negotiable_salaries);
    println!("   Unrecognised salaries: {}", output.stats.unknown_salaries);
    println!("   Unrecognised locations: {}", output.stats.unknown_locations);
    println!("   Rows written: {} ({} in store)", written, total);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging("logs");

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    let result = match cli.command {
        Commands::Normalize { input, db } => {
            println!("🔄 Normalizing CSV listings...");
            let path = input.unwrap_or_else(|| config.input.csv_path.clone());
            let store = open_store(&config, db)?;
            run_source(&CsvFileSource::new(path), &config, store).await
        }
        Commands::Crawl { pages, db } => {
            println!("🕷️  Crawling TopCV listings...");
            if let Some(pages) = pages {
                config.crawler.max_pages = pages;
            }
            let store = open_store(&config, db)?;
            let source = TopCvSource::new(config.crawler.clone())?;
            run_source(&source, &config, store).await
        }
        Commands::Report { db, json } => {
            let store = open_store(&config, db)?;
            let rows = store.all_rows().await?;
            let report = Report::build(&rows);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.render_text());
            }
            Ok(())
        }
    };

    match &result {
        Ok(()) => info!("Run complete"),
        Err(e) => {
            error!("Run failed: {}", e);
            println!("❌ Run failed: {}", e);
        }
    }
    result
}
