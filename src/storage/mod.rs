//! Credential lookup and keyword persistence
//!
//! Two collaborator seams, each behind an async trait:
//!
//! - [`CredentialStore`] - resolves the active provider credential
//! - [`TrendRecordSink`] - persists a batch of normalized keyword records
//!
//! Implementations:
//!
//! - [`env`] - credentials from `DATAFORSEO_*` environment variables
//! - [`repository`] - SQLite and in-memory stores and sinks
//! - [`postgres`] - PostgreSQL stores and sinks over a `deadpool-postgres` pool

pub mod env;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{
    Config as PoolConfig, ManagerConfig, Pool, PoolConfig as PoolSize, RecyclingMethod, Runtime,
};
use thiserror::Error;
use tokio_postgres::NoTls;

use crate::config::{Config, CredentialSource, StorageBackend, StorageConfig};
use crate::error::{ErrorCategory, TrendlensErrorTrait};
use crate::models::KeywordRecord;
use crate::provider::ProviderCredential;

pub use env::EnvCredentialStore;
pub use postgres::{PostgresCredentialStore, PostgresKeywordSink};
pub use repository::{
    InMemoryCredentialStore, InMemoryKeywordSink, SqliteCredentialStore, SqliteKeywordSink,
    StoredKeyword,
};

/// Storage-layer failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Failed to create connection pool: {0}")]
    PoolCreation(#[from] deadpool_postgres::CreatePoolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Value for {field} out of range: {value}")]
    ValueOutOfRange { field: &'static str, value: String },

    /// Backend refused the write (used by in-memory sinks to simulate outages)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl TrendlensErrorTrait for StorageError {
    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Postgres(_) | Self::Pool(_) | Self::Io(_) | Self::Unavailable(_)
        )
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::PoolCreation(_) => ErrorCategory::Config,
            _ => ErrorCategory::Storage,
        }
    }
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Source of provider credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Active credential for `provider`, or `None` when none is configured
    async fn get_active_credential(
        &self,
        provider: &str,
    ) -> Result<Option<ProviderCredential>, StorageError>;
}

/// Destination for normalized keyword records
#[async_trait]
pub trait TrendRecordSink: Send + Sync {
    /// Persist a batch as one unit and return the number of rows written
    ///
    /// Either every record is persisted or the call fails.
    async fn save_batch(&self, records: &[KeywordRecord]) -> Result<usize, StorageError>;
}

pub type SharedCredentialStore = Arc<dyn CredentialStore>;
pub type SharedRecordSink = Arc<dyn TrendRecordSink>;

// ============================================================================
// Factories
// ============================================================================

/// Create a PostgreSQL connection pool
pub fn create_pool(url: &str, max_size: usize) -> Result<Pool, StorageError> {
    let mut cfg = PoolConfig::new();
    cfg.url = Some(url.to_string());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolSize::new(max_size));

    Ok(cfg.create_pool(Some(Runtime::Tokio1), NoTls)?)
}

/// Build the credential store selected by configuration
pub fn create_credential_store(config: &Config) -> Result<SharedCredentialStore, StorageError> {
    let store: SharedCredentialStore = match config.credentials.source {
        CredentialSource::Env => Arc::new(EnvCredentialStore::new(&config.provider.base_url)),
        CredentialSource::Sqlite => Arc::new(SqliteCredentialStore::new(&config.storage.sqlite_path)?),
        CredentialSource::Postgres => Arc::new(PostgresCredentialStore::new(create_pool(
            &config.storage.postgres_url,
            config.storage.pool_size,
        )?)),
    };

    tracing::debug!(source = ?config.credentials.source, "Credential store created");
    Ok(store)
}

/// Build the keyword sink selected by configuration
///
/// PostgreSQL sinks create their table up front so a bad URL fails at startup.
pub async fn create_record_sink(config: &StorageConfig) -> Result<SharedRecordSink, StorageError> {
    let sink: SharedRecordSink = match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryKeywordSink::new()),
        StorageBackend::Sqlite => Arc::new(SqliteKeywordSink::new(&config.sqlite_path)?),
        StorageBackend::Postgres => {
            let sink = PostgresKeywordSink::new(create_pool(&config.postgres_url, config.pool_size)?);
            sink.ensure_schema().await?;
            Arc::new(sink)
        }
    };

    tracing::info!(backend = ?config.backend, "Keyword sink ready");
    Ok(sink)
}
