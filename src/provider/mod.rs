//! DataForSEO provider integration
//!
//! This module owns everything that talks to the third-party keyword data API:
//!
//! - [`client`] - Basic-auth HTTP client posting task arrays to `.../live` endpoints
//! - [`payload`] - Request task types and response-to-model mapping
//!
//! Provider calls never raise errors to callers. They resolve to a
//! [`ProviderResult`], and the fallback to synthetic data is an explicit branch
//! on [`ProviderResult::Unavailable`] in the trends client.

pub mod client;
pub mod payload;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ErrorCategory, TrendlensErrorTrait};

pub use client::DataForSeoClient;

/// Provider name used for credential lookups unless configured otherwise
pub const DEFAULT_PROVIDER: &str = "dataforseo";

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.dataforseo.com/v3";

/// Status code the provider uses for a successful request or task
pub const STATUS_OK: u32 = 20000;

/// Provider endpoint paths, relative to the credential's base URL
pub mod endpoints {
    pub const TRENDS_EXPLORE: &str = "keywords_data/google_trends/explore/live";
    pub const RELATED_KEYWORDS: &str = "dataforseo_labs/google/related_keywords/live";
    pub const KEYWORD_IDEAS: &str = "dataforseo_labs/google/keyword_ideas/live";
}

/// Credentials for one provider account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCredential {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl ProviderCredential {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Single API key used as both halves of Basic auth
    pub fn from_api_key(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        Self::new(base_url, key.clone(), key)
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Reasons a provider call could not produce live data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// No active credential record for the provider
    #[error("No active credential for provider {provider}: {reason}")]
    CredentialUnavailable { provider: String, reason: String },

    /// HTTP client could not be built
    #[error("Failed to initialize provider client: {0}")]
    ClientInit(String),

    /// Request exceeded the configured timeout
    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Connection-level failure
    #[error("Transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// Non-2xx HTTP status
    #[error("HTTP {status} from {endpoint}: {body}")]
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Provider-level status code other than 20000
    #[error("Provider status {status_code} from {endpoint}: {message}")]
    Api {
        endpoint: String,
        status_code: u32,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected payload from {endpoint}: {reason}")]
    Payload { endpoint: String, reason: String },

    /// Well-formed response without any usable items
    #[error("Empty result from {endpoint}")]
    EmptyResult { endpoint: String },
}

impl ProviderError {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::CredentialUnavailable { .. } => "credential_unavailable",
            Self::ClientInit(_) => "client_init",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Api { .. } => "api_status",
            Self::Payload { .. } => "payload",
            Self::EmptyResult { .. } => "empty_result",
        }
    }

    pub fn payload(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::Payload {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

impl TrendlensErrorTrait for ProviderError {
    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Transport { .. } | Self::HttpStatus { .. }
        )
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::CredentialUnavailable { .. } | Self::ClientInit(_) => ErrorCategory::Config,
            Self::Timeout { .. } | Self::Transport { .. } | Self::HttpStatus { .. } => {
                ErrorCategory::Network
            }
            Self::Api { .. } | Self::Payload { .. } | Self::EmptyResult { .. } => {
                ErrorCategory::Parsing
            }
        }
    }
}

/// Outcome of a provider call
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult<T> {
    /// Live data from the provider
    Live(T),
    /// Live data could not be obtained
    Unavailable(ProviderError),
}

impl<T> ProviderResult<T> {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ProviderResult<U> {
        match self {
            Self::Live(value) => ProviderResult::Live(f(value)),
            Self::Unavailable(reason) => ProviderResult::Unavailable(reason),
        }
    }

    /// Chain a fallible step on live data
    pub fn and_then<U, F>(self, f: F) -> ProviderResult<U>
    where
        F: FnOnce(T) -> Result<U, ProviderError>,
    {
        match self {
            Self::Live(value) => f(value).into(),
            Self::Unavailable(reason) => ProviderResult::Unavailable(reason),
        }
    }
}

impl<T> From<Result<T, ProviderError>> for ProviderResult<T> {
    fn from(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Self::Live(value),
            Err(reason) => Self::Unavailable(reason),
        }
    }
}
