//! Configuration management for trendlens
//!
//! Configuration comes from `TRENDLENS_*` environment variables or a TOML file.
//! Provider credentials are not part of it; they are resolved at runtime through
//! the configured credential store.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::provider::{DEFAULT_BASE_URL, DEFAULT_PROVIDER};
use crate::utils::validate_http_url;

/// Allowed provider timeout range in seconds
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=120;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Keyword data provider configuration
    pub provider: ProviderConfig,

    /// Where provider credentials come from
    pub credentials: CredentialsConfig,

    /// Keyword record storage
    pub storage: StorageConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name used for credential lookups
    pub name: String,

    /// API root used when a credential does not carry its own
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Language code for keyword research requests
    pub language_code: String,

    /// Location used when a request does not name one
    pub default_location: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROVIDER.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            language_code: String::from("en"),
            default_location: String::from("United States"),
        }
    }
}

/// Credential source selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// `DATAFORSEO_*` environment variables
    #[default]
    Env,
    /// `api_credentials` table in the SQLite database
    Sqlite,
    /// `api_credentials` table in PostgreSQL
    Postgres,
}

impl std::str::FromStr for CredentialSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "env" => Ok(Self::Env),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => anyhow::bail!("Unknown credential source '{other}'"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CredentialsConfig {
    pub source: CredentialSource,
}

/// Keyword storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Sqlite,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => anyhow::bail!("Unknown storage backend '{other}'"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// SQLite database path
    pub sqlite_path: PathBuf,

    /// PostgreSQL connection string
    pub postgres_url: String,

    /// Maximum pool size
    pub pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            sqlite_path: PathBuf::from("data/trendlens.db"),
            postgres_url: String::from("postgresql://localhost/trendlens"),
            pool_size: 10,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (host:port)
    pub bind_address: String,

    /// Enable permissive CORS
    pub enable_cors: bool,

    /// Enable request tracing
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0:8080"),
            enable_cors: true,
            request_logging: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_or(name: &str, default: impl Into<String>) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.into())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {name}: {e}")),
        _ => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let provider = ProviderConfig {
            name: env_or("TRENDLENS_PROVIDER", defaults.provider.name),
            base_url: env_or("TRENDLENS_PROVIDER_BASE_URL", defaults.provider.base_url),
            timeout_secs: env_parse("TRENDLENS_PROVIDER_TIMEOUT")?
                .unwrap_or(defaults.provider.timeout_secs),
            language_code: env_or("TRENDLENS_LANGUAGE_CODE", defaults.provider.language_code),
            default_location: env_or(
                "TRENDLENS_DEFAULT_LOCATION",
                defaults.provider.default_location,
            ),
        };

        let credentials = CredentialsConfig {
            source: env_parse("TRENDLENS_CREDENTIAL_SOURCE")?
                .unwrap_or(defaults.credentials.source),
        };

        let postgres_url = std::env::var("TRENDLENS_POSTGRES_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or(defaults.storage.postgres_url);

        let storage = StorageConfig {
            backend: env_parse("TRENDLENS_STORAGE_BACKEND")?.unwrap_or(defaults.storage.backend),
            sqlite_path: env_parse("TRENDLENS_SQLITE_PATH")?
                .unwrap_or(defaults.storage.sqlite_path),
            postgres_url,
            pool_size: env_parse("TRENDLENS_POOL_SIZE")?.unwrap_or(defaults.storage.pool_size),
        };

        let server = ServerConfig {
            bind_address: env_or("TRENDLENS_BIND_ADDRESS", defaults.server.bind_address),
            enable_cors: env_parse("TRENDLENS_ENABLE_CORS")?.unwrap_or(defaults.server.enable_cors),
            request_logging: env_parse("TRENDLENS_REQUEST_LOGGING")?
                .unwrap_or(defaults.server.request_logging),
        };

        let logging = LoggingConfig {
            level: env_or("TRENDLENS_LOG_LEVEL", defaults.logging.level),
            format: env_or("TRENDLENS_LOG_FORMAT", defaults.logging.format),
        };

        Ok(Self {
            provider,
            credentials,
            storage,
            server,
            logging,
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.provider.name.trim().is_empty() {
            anyhow::bail!("provider.name must not be empty");
        }

        if !TIMEOUT_RANGE_SECS.contains(&self.provider.timeout_secs) {
            anyhow::bail!(
                "provider.timeout_secs must be between {} and {} (got {})",
                TIMEOUT_RANGE_SECS.start(),
                TIMEOUT_RANGE_SECS.end(),
                self.provider.timeout_secs
            );
        }

        validate_http_url(&self.provider.base_url).context("provider.base_url is invalid")?;

        if self.storage.pool_size == 0 {
            anyhow::bail!("storage.pool_size must be greater than 0");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("Invalid bind address: {}", self.server.bind_address))?;

        Ok(())
    }

    /// Get provider request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }
}
