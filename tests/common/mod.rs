//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use trendlens::provider::ProviderCredential;
use trendlens::storage::InMemoryCredentialStore;
use trendlens::trends::{TrendClientConfig, TrendDataClient};
use wiremock::MockServer;

pub const LOGIN: &str = "login";
pub const PASSWORD: &str = "secret";

/// Basic auth header value for `LOGIN:PASSWORD`
pub const BASIC_AUTH: &str = "Basic bG9naW46c2VjcmV0";

/// Credential pointing at a wiremock server
pub fn credential_for(server: &MockServer) -> ProviderCredential {
    ProviderCredential::new(format!("{}/v3", server.uri()), LOGIN, PASSWORD)
}

/// Live client against `server` with the given request timeout
pub fn live_client(
    server: &MockServer,
    timeout: Duration,
) -> (TrendDataClient, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::with_credential(
        "dataforseo",
        credential_for(server),
    ));
    let config = TrendClientConfig {
        timeout,
        ..TrendClientConfig::default()
    };
    (TrendDataClient::new(config, store.clone()), store)
}

/// Client without any credential
pub fn mock_only_client() -> (TrendDataClient, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new());
    (
        TrendDataClient::new(TrendClientConfig::default(), store.clone()),
        store,
    )
}

pub fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
