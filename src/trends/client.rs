//! Trend and keyword research client with mock fallback
//!
//! The client resolves its provider credential once, on first use. From then
//! on every call either returns live provider data or, when the provider is
//! unavailable for any reason, deterministic mock data for the whole request.
//! Callers never see a provider error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::OnceCell;

use super::mock::MockTrendGenerator;
use super::range::TimeRange;
use crate::config::Config;
use crate::metrics;
use crate::models::{KeywordMetrics, KeywordSource, TrendDataPoint};
use crate::provider::payload::{
    build_trends_tasks, parse_keyword_metrics, parse_trends, KeywordIdeasTask, LabsResult,
    RelatedKeywordsTask, TrendsExploreResult,
};
use crate::provider::{endpoints, DataForSeoClient, ProviderError, ProviderResult, DEFAULT_PROVIDER};
use crate::storage::SharedCredentialStore;
use crate::utils::clean_terms;

/// Deepest related-keywords search the provider supports
pub const MAX_RELATED_DEPTH: u8 = 4;

/// Upper bound for keyword ideas per request
pub const MAX_IDEAS_LIMIT: u32 = 1000;

/// Keyword ideas returned when the caller does not ask for a specific number
pub const DEFAULT_IDEAS_LIMIT: u32 = 50;

/// Client settings
#[derive(Debug, Clone)]
pub struct TrendClientConfig {
    /// Provider name passed to the credential store
    pub provider_name: String,
    pub timeout: Duration,
    pub language_code: String,
}

impl Default for TrendClientConfig {
    fn default() -> Self {
        Self {
            provider_name: DEFAULT_PROVIDER.to_string(),
            timeout: Duration::from_secs(30),
            language_code: String::from("en"),
        }
    }
}

impl From<&Config> for TrendClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            provider_name: config.provider.name.clone(),
            timeout: config.request_timeout(),
            language_code: config.provider.language_code.clone(),
        }
    }
}

/// Mode decided on first use
pub enum ClientMode {
    /// Provider credential found and HTTP client built
    Live(DataForSeoClient),
    /// Every call is answered with mock data
    MockOnly { reason: ProviderError },
}

/// Keyword/trend research client
pub struct TrendDataClient {
    config: TrendClientConfig,
    credentials: SharedCredentialStore,
    mock: MockTrendGenerator,
    mode: OnceCell<ClientMode>,
}

impl TrendDataClient {
    pub fn new(config: TrendClientConfig, credentials: SharedCredentialStore) -> Self {
        Self {
            config,
            credentials,
            mock: MockTrendGenerator::new(),
            mode: OnceCell::new(),
        }
    }

    /// Client that has not resolved credentials yet
    pub fn from_config(config: &Config, credentials: SharedCredentialStore) -> Arc<Self> {
        Arc::new(Self::new(TrendClientConfig::from(config), credentials))
    }

    /// Whether the client is initialized and serving live data
    ///
    /// `None` until the first call resolves the mode.
    pub fn is_live(&self) -> Option<bool> {
        self.mode
            .get()
            .map(|mode| matches!(mode, ClientMode::Live(_)))
    }

    /// Forget the resolved mode; the next call looks the credential up again
    pub fn reset(&mut self) {
        self.mode = OnceCell::new();
        tracing::info!(provider = %self.config.provider_name, "Trend client reset");
    }

    /// Resolve the client mode at most once, even under concurrent first calls
    async fn mode(&self) -> &ClientMode {
        self.mode.get_or_init(|| self.initialize()).await
    }

    async fn initialize(&self) -> ClientMode {
        let provider = self.config.provider_name.as_str();

        let credential = match self.credentials.get_active_credential(provider).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                return self.mock_only(ProviderError::CredentialUnavailable {
                    provider: provider.to_string(),
                    reason: "no active credential".to_string(),
                })
            }
            Err(e) => {
                return self.mock_only(ProviderError::CredentialUnavailable {
                    provider: provider.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        match DataForSeoClient::new(credential, self.config.timeout) {
            Ok(client) => {
                tracing::info!(
                    provider,
                    base_url = %client.base_url(),
                    timeout_secs = self.config.timeout.as_secs(),
                    "Trend client initialized in live mode"
                );
                ClientMode::Live(client)
            }
            Err(e) => self.mock_only(e),
        }
    }

    fn mock_only(&self, reason: ProviderError) -> ClientMode {
        tracing::warn!(
            provider = %self.config.provider_name,
            reason = %reason,
            "Trend client running in mock-only mode"
        );
        ClientMode::MockOnly { reason }
    }

    // ========================================================================
    // Trends
    // ========================================================================

    /// Trend data for each keyword, in input order
    ///
    /// An empty keyword list returns an empty result without contacting the
    /// provider.
    pub async fn get_trend_data(
        &self,
        keywords: &[String],
        location: &str,
        range: TimeRange,
    ) -> Vec<TrendDataPoint> {
        self.get_trend_data_at(keywords, location, range, Utc::now().date_naive())
            .await
    }

    /// [`get_trend_data`](Self::get_trend_data) relative to a fixed "today"
    pub async fn get_trend_data_at(
        &self,
        keywords: &[String],
        location: &str,
        range: TimeRange,
        today: NaiveDate,
    ) -> Vec<TrendDataPoint> {
        let keywords = clean_terms(keywords);
        if keywords.is_empty() {
            return Vec::new();
        }

        let result = match self.mode().await {
            ClientMode::Live(client) => {
                let tasks = build_trends_tasks(&keywords, location, range.window(today));
                client
                    .post_live::<_, TrendsExploreResult>(endpoints::TRENDS_EXPLORE, &tasks)
                    .await
                    .and_then(|results| {
                        parse_trends(endpoints::TRENDS_EXPLORE, &keywords, range, today, results)
                    })
            }
            ClientMode::MockOnly { reason } => ProviderResult::Unavailable(reason.clone()),
        };

        match result {
            ProviderResult::Live(points) => {
                tracing::info!(
                    keywords = keywords.len(),
                    location,
                    range = %range,
                    "Served live trend data"
                );
                points
            }
            ProviderResult::Unavailable(reason) => {
                record_fallback("trend_data", &reason, keywords.len());
                self.mock.trend_data(&keywords, location, range, today)
            }
        }
    }

    // ========================================================================
    // Keyword research
    // ========================================================================

    /// Keywords related to each seed; `depth` is clamped to the provider maximum
    pub async fn get_related_keywords(
        &self,
        keywords: &[String],
        location: &str,
        depth: u8,
    ) -> Vec<KeywordMetrics> {
        let keywords = clean_terms(keywords);
        if keywords.is_empty() {
            return Vec::new();
        }
        let depth = depth.min(MAX_RELATED_DEPTH);

        let result = match self.mode().await {
            ClientMode::Live(client) => {
                let tasks: Vec<RelatedKeywordsTask> = keywords
                    .iter()
                    .map(|keyword| RelatedKeywordsTask {
                        keyword: keyword.clone(),
                        location_name: location.to_string(),
                        language_code: self.config.language_code.clone(),
                        depth,
                        limit: DEFAULT_IDEAS_LIMIT * u32::from(depth + 1),
                    })
                    .collect();
                client
                    .post_live::<_, LabsResult>(endpoints::RELATED_KEYWORDS, &tasks)
                    .await
                    .and_then(|results| {
                        parse_keyword_metrics(
                            endpoints::RELATED_KEYWORDS,
                            KeywordSource::RelatedKeywords,
                            results,
                        )
                    })
            }
            ClientMode::MockOnly { reason } => ProviderResult::Unavailable(reason.clone()),
        };

        match result {
            ProviderResult::Live(metrics) => metrics,
            ProviderResult::Unavailable(reason) => {
                record_fallback("related_keywords", &reason, keywords.len());
                self.mock.related_keywords(&keywords, location, depth)
            }
        }
    }

    /// Keyword ideas for a seed set, at most `limit` rows
    pub async fn get_keyword_ideas(
        &self,
        keywords: &[String],
        location: &str,
        limit: u32,
    ) -> Vec<KeywordMetrics> {
        let keywords = clean_terms(keywords);
        let limit = limit.clamp(1, MAX_IDEAS_LIMIT);
        if keywords.is_empty() {
            return Vec::new();
        }

        let result = match self.mode().await {
            ClientMode::Live(client) => {
                let task = KeywordIdeasTask {
                    keywords: keywords.clone(),
                    location_name: location.to_string(),
                    language_code: self.config.language_code.clone(),
                    limit,
                };
                client
                    .post_live::<_, LabsResult>(endpoints::KEYWORD_IDEAS, &[task])
                    .await
                    .and_then(|results| {
                        parse_keyword_metrics(
                            endpoints::KEYWORD_IDEAS,
                            KeywordSource::KeywordIdeas,
                            results,
                        )
                    })
                    .map(|mut metrics| {
                        metrics.truncate(limit as usize);
                        metrics
                    })
            }
            ClientMode::MockOnly { reason } => ProviderResult::Unavailable(reason.clone()),
        };

        match result {
            ProviderResult::Live(metrics) => metrics,
            ProviderResult::Unavailable(reason) => {
                record_fallback("keyword_ideas", &reason, keywords.len());
                self.mock.keyword_ideas(&keywords, location, limit)
            }
        }
    }
}

fn record_fallback(operation: &str, reason: &ProviderError, keywords: usize) {
    tracing::warn!(
        operation,
        reason = reason.label(),
        error = %reason,
        keywords,
        "Provider unavailable, serving mock data"
    );
    metrics::record_fallback(operation, reason.label());
}
