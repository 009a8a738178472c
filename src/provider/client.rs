//! Basic-auth HTTP client for the DataForSEO `live` endpoints
//!
//! Every endpoint accepts a JSON array of tasks and answers with an envelope:
//!
//! ```text
//! { "status_code": 20000, "status_message": "Ok.",
//!   "tasks": [ { "status_code": 20000, "result": [ ... ] } ] }
//! ```
//!
//! The client checks the HTTP status, the envelope status and each task status,
//! then hands back the flattened `result` entries. It never retries; a single
//! failed round trip becomes [`ProviderResult::Unavailable`].

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ProviderCredential, ProviderError, ProviderResult, STATUS_OK};
use crate::metrics;
use crate::utils::truncate_text;

/// Longest response body excerpt kept in an error
const ERROR_BODY_LIMIT: usize = 256;

// ============================================================================
// Response Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProviderEnvelope<R> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    #[serde(default = "Vec::new")]
    tasks: Vec<ProviderTask<R>>,
}

#[derive(Debug, Deserialize)]
struct ProviderTask<R> {
    status_code: u32,
    #[serde(default)]
    status_message: String,
    result: Option<Vec<R>>,
}

// ============================================================================
// DataForSEO Client
// ============================================================================

/// HTTP client bound to one provider credential
pub struct DataForSeoClient {
    http_client: Client,
    credential: ProviderCredential,
}

impl DataForSeoClient {
    /// Create a client with a fixed request timeout
    pub fn new(credential: ProviderCredential, timeout: Duration) -> Result<Self, ProviderError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(format!("trendlens/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::ClientInit(e.to_string()))?;

        Ok(Self {
            http_client,
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.credential.base_url
    }

    /// Full URL for an endpoint path
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.credential.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// POST a task array to a `live` endpoint and collect every task's results
    pub async fn post_live<T, R>(&self, endpoint: &str, tasks: &[T]) -> ProviderResult<Vec<R>>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        let result = self.send(endpoint, tasks).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        metrics::record_provider_request(endpoint, outcome, started.elapsed().as_secs_f64());

        match &result {
            Ok(results) => tracing::debug!(
                endpoint = %endpoint,
                tasks = tasks.len(),
                results = results.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Provider request succeeded"
            ),
            Err(e) => tracing::warn!(
                endpoint = %endpoint,
                base_url = %self.credential.base_url,
                reason = e.label(),
                error = %e,
                "Provider request failed"
            ),
        }

        result.into()
    }

    async fn send<T, R>(&self, endpoint: &str, tasks: &[T]) -> Result<Vec<R>, ProviderError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.credential.username, Some(&self.credential.password))
            .json(tasks)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: truncate_text(&body, ERROR_BODY_LIMIT),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(endpoint, &e))?;

        let envelope: ProviderEnvelope<R> = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::payload(endpoint, e.to_string()))?;

        unwrap_envelope(endpoint, envelope)
    }
}

fn transport_error(endpoint: &str, err: &reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            endpoint: endpoint.to_string(),
        }
    } else {
        ProviderError::Transport {
            endpoint: endpoint.to_string(),
            message: err.to_string(),
        }
    }
}

fn unwrap_envelope<R>(endpoint: &str, envelope: ProviderEnvelope<R>) -> Result<Vec<R>, ProviderError> {
    if envelope.status_code != STATUS_OK {
        return Err(ProviderError::Api {
            endpoint: endpoint.to_string(),
            status_code: envelope.status_code,
            message: envelope.status_message,
        });
    }

    if envelope.tasks.is_empty() {
        return Err(ProviderError::payload(endpoint, "response contained no tasks"));
    }

    let mut results = Vec::new();
    for task in envelope.tasks {
        if task.status_code != STATUS_OK {
            return Err(ProviderError::Api {
                endpoint: endpoint.to_string(),
                status_code: task.status_code,
                message: task.status_message,
            });
        }
        results.extend(task.result.unwrap_or_default());
    }

    if results.is_empty() {
        return Err(ProviderError::EmptyResult {
            endpoint: endpoint.to_string(),
        });
    }

    Ok(results)
}

// ============================================================================
// Tests
// ============================================================================
