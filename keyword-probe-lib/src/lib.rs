//! # Keyword Probe Library
//!
//! Fetches a list of hosts over HTTP(S) with bounded concurrency and classifies
//! each response body against a vocabulary of keywords.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keyword_probe_lib::{HostTarget, KeywordScanner, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = KeywordScanner::with_config(ScanConfig::default())?;
//!     let targets = vec![HostTarget::from_line("example.com").unwrap()];
//!     let results = scanner.run(&targets).await;
//!
//!     for verdict in results.iter() {
//!         println!("{} matched={} {:?}", verdict.url, verdict.matched, verdict.keywords);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Admission control**: at most N fetches in flight at any instant
//! - **Failure isolation**: a failed host never affects the others
//! - **Pure classification**: case-insensitive literal keyword matching
//! - **Configurable**: concurrency, timeout, body cap and vocabulary

// Re-export main public API types and functions
pub use aggregator::ResultAggregator;
pub use concurrent::{AdmissionController, AdmissionPermit};
pub use config::{
    load_env_config, split_keywords, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
    VocabularyConfig,
};
pub use error::ScanError;
pub use export::{format_verdict_row, write_results_csv};
pub use fetcher::HttpFetcher;
pub use matcher::{Classification, KeywordVocabulary, DEFAULT_KEYWORDS};
pub use scanner::KeywordScanner;
pub use types::{
    FetchFailure, FetchOutcome, HostTarget, ResultSet, ScanConfig, ScanReport, Verdict,
};
pub use utils::{load_targets_from_file, parse_targets, parse_timeout_string};

mod aggregator;
mod concurrent;
mod config;
mod error;
mod export;
mod fetcher;
mod matcher;
mod scanner;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScanError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Default input file name used when none is configured.
pub const DEFAULT_INPUT_FILE: &str = "SaaS.txt";

/// Default output file name used when none is configured.
pub const DEFAULT_OUTPUT_FILE: &str = "checkedURLs.csv";
