/// Shared names and defaults used across the pipeline, storage and CLI.

// City sentinels produced by the location extractor
pub const UNKNOWN_CITY: &str = "Unknown";
pub const NATIONWIDE_CITY: &str = "Toàn Quốc";
pub const OVERSEAS_CITY: &str = "Nước Ngoài";
pub const MULTI_LOCATION_CITY: &str = "Multi-location";

/// Cities that do not name a real place; excluded from city-level reports
pub const SENTINEL_CITIES: [&str; 4] = [
    UNKNOWN_CITY,
    NATIONWIDE_CITY,
    MULTI_LOCATION_CITY,
    OVERSEAS_CITY,
];

/// Salary text assumed by the crawler when a listing shows none
pub const DEFAULT_CRAWLED_SALARY: &str = "Thoả thuận";

// Storage
pub const DEFAULT_TABLE_NAME: &str = "job_listings_clean";
pub const DEFAULT_DATABASE_PATH: &str = "data/jobs.db";
pub const DEFAULT_CSV_PATH: &str = "data/data.csv";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

// TopCV crawler
pub const TOPCV_SOURCE: &str = "topcv";
pub const TOPCV_BASE_URL: &str = "https://www.topcv.vn";
pub const TOPCV_LISTING_PATH: &str = "/viec-lam-tot-nhat";
pub const DEFAULT_MAX_PAGES: u32 = 10;

pub const CSV_SOURCE: &str = "csv";

// Environment overrides
pub const ENV_CSV_PATH: &str = "JOBS_CSV_PATH";
pub const ENV_DATABASE_PATH: &str = "JOBS_DATABASE_PATH";
