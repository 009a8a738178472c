//! trendlens - keyword and trend research backed by DataForSEO
//!
//! Trend series and keyword metrics come from the DataForSEO API when
//! credentials are available. When they are not, or when a live call fails,
//! every operation answers with deterministic mock data instead of an error.
//!
//! # Architecture
//!
//! - [`config`] - Configuration from TOML files and environment variables
//! - [`provider`] - DataForSEO wire client and payload codecs
//! - [`trends`] - Research client with mock fallback and time range handling
//! - [`keywords`] - Normalization and batch submission of keyword rows
//! - [`storage`] - Credential stores and record sinks (SQLite, PostgreSQL)
//! - [`server`] - REST API over the research and storage operations
//! - [`metrics`] - Prometheus counters and histograms
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use trendlens::config::Config;
//! use trendlens::storage::EnvCredentialStore;
//! use trendlens::trends::{TimeRange, TrendDataClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let credentials = Arc::new(EnvCredentialStore::new(&config.provider.base_url));
//!     let client = TrendDataClient::from_config(&config, credentials);
//!
//!     let keywords = vec!["solar panels".to_string()];
//!     let points = client
//!         .get_trend_data(&keywords, "United States", TimeRange::Days90)
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&points)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod keywords;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod server;
pub mod storage;
pub mod trends;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, TrendlensErrorTrait};
    pub use crate::keywords::{
        BatchReport, KeywordBatchService, NormalizationContext, RawKeywordEntry,
    };
    pub use crate::models::{
        DataSource, KeywordMetrics, KeywordRecord, KeywordSource, TrendDataPoint, TrendPoint,
    };
    pub use crate::storage::{CredentialStore, TrendRecordSink};
    pub use crate::trends::{TimeRange, TrendDataClient};
}

// Direct re-exports for convenience
pub use models::{DataSource, KeywordMetrics, KeywordRecord, TrendDataPoint};
