//! Unified error handling for the trendlens crate
//!
//! Each domain keeps its own error enum; this module ties them together.
//!
//! - [`TrendlensErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use trendlens::error::{Error, TrendlensErrorTrait};
//!
//! fn report(err: &Error) {
//!     if err.is_recoverable() {
//!         tracing::warn!(category = err.category().as_str(), "Transient failure: {err}");
//!     } else {
//!         tracing::error!(category = err.category().as_str(), "Fatal failure: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::keywords::RecordValidationError;
pub use crate::provider::ProviderError;
pub use crate::storage::StorageError;
pub use crate::trends::range::InvalidTimeRange;

/// Common trait for all trendlens error types
pub trait TrendlensErrorTrait: std::error::Error {
    /// Check if this error is transient (a later attempt may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, connection)
    Network,
    /// Unexpected or malformed payloads
    Parsing,
    /// Invalid caller-supplied data
    Validation,
    /// Storage and I/O errors
    Storage,
    /// Configuration and credential errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Validation => "validation",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the trendlens crate
#[derive(Error, Debug)]
pub enum Error {
    /// Provider call failures
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A keyword record failed normalization
    #[error("Invalid keyword record: {0}")]
    Validation(#[from] RecordValidationError),

    /// Credential store and sink failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Unsupported time range string
    #[error(transparent)]
    TimeRange(#[from] InvalidTimeRange),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TrendlensErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_recoverable(),
            Self::Validation(e) => e.is_recoverable(),
            Self::Storage(e) => e.is_recoverable(),
            Self::TimeRange(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Provider(e) => e.category(),
            Self::Validation(e) => e.category(),
            Self::Storage(e) => e.category(),
            Self::TimeRange(_) => ErrorCategory::Validation,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Parsing,
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: format!("{err:#}"),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
