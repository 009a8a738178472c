//! Provider failure scenarios
//!
//! Every failure mode must end in a complete mock response:
//! 1. HTTP error responses
//! 2. Timeouts and refused connections
//! 3. Non-20000 envelope or task status
//! 4. Malformed or incomplete payloads
//! 5. Missing or unreadable credentials

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::json;
use trendlens::models::DataSource;
use trendlens::provider::ProviderCredential;
use trendlens::storage::InMemoryCredentialStore;
use trendlens::trends::{TimeRange, TrendClientConfig, TrendDataClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{
    envelope, failed_task, trends_result, trends_result_over, RELATED_PATH, TRENDS_PATH,
};
use crate::common::{live_client, mock_only_client, terms};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
}

async fn assert_trends_fall_back(client: &TrendDataClient) {
    let keywords = terms(&["solar panels", "heat pump"]);
    let points = client
        .get_trend_data_at(&keywords, "United States", TimeRange::Months12, today())
        .await;

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].keyword, "solar panels");
    assert_eq!(points[1].keyword, "heat pump");
    assert!(
        points.iter().all(|p| p.source == DataSource::Mock),
        "live and mock points must never be mixed"
    );
    assert!(points.iter().all(|p| p.time_series.len() == 12));
}

// ============================================================================
// HTTP and Transport Failures
// ============================================================================

#[tokio::test]
async fn test_server_error_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    assert_trends_fall_back(&client).await;
    // The credential was fine; the client stays live for later calls
    assert_eq!(client.is_live(), Some(true));
}

#[tokio::test]
async fn test_unauthorized_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status_code": 40100,
            "status_message": "You are not authorized to access this resource."
        })))
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    assert_trends_fall_back(&client).await;
}

#[tokio::test]
async fn test_timeout_falls_back() {
    let server = MockServer::start().await;

    // Mock with long delay to trigger timeout
    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(vec![trends_result(
                    &["solar panels", "heat pump"],
                    TimeRange::Months12,
                    today(),
                )]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_millis(200));
    assert_trends_fall_back(&client).await;
}

#[tokio::test]
async fn test_connection_refused_falls_back() {
    let store = Arc::new(InMemoryCredentialStore::with_credential(
        "dataforseo",
        ProviderCredential::new("http://127.0.0.1:1/v3", "login", "secret"),
    ));
    let client = TrendDataClient::new(TrendClientConfig::default(), store);
    assert_trends_fall_back(&client).await;
}

// ============================================================================
// Envelope and Payload Failures
// ============================================================================

#[tokio::test]
async fn test_envelope_status_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 50000,
            "status_message": "Internal Error.",
            "tasks": []
        })))
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    assert_trends_fall_back(&client).await;
}

#[tokio::test]
async fn test_task_status_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(failed_task(40501, "Invalid Field: 'keywords'.")),
        )
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    assert_trends_fall_back(&client).await;
}

#[tokio::test]
async fn test_missing_keyword_in_payload_falls_back() {
    let server = MockServer::start().await;

    // Only one of the two requested keywords comes back
    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(vec![trends_result(
                &["solar panels"],
                TimeRange::Months12,
                today(),
            )])),
        )
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    assert_trends_fall_back(&client).await;
}

#[tokio::test]
async fn test_series_with_missing_period_falls_back() {
    let server = MockServer::start().await;

    // The most recent month is absent from the graph
    let mut months = TimeRange::Months12.period_starts(today());
    months.pop();
    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![
            trends_result_over(&["solar panels", "heat pump"], &months),
        ])))
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    assert_trends_fall_back(&client).await;
}

#[tokio::test]
async fn test_malformed_body_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    assert_trends_fall_back(&client).await;
}

#[tokio::test]
async fn test_empty_labs_result_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RELATED_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(vec![json!({"items": []})])),
        )
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    let rows = client
        .get_related_keywords(&terms(&["coffee"]), "United States", 0)
        .await;

    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|m| m.provenance == DataSource::Mock));
}

// ============================================================================
// Credential Resolution
// ============================================================================

#[tokio::test]
async fn test_mock_only_client_never_contacts_provider() {
    let (client, store) = mock_only_client();
    assert_trends_fall_back(&client).await;
    assert_eq!(client.is_live(), Some(false));
    assert_eq!(store.lookup_count(), 1);
}

#[tokio::test]
async fn test_concurrent_first_calls_resolve_credentials_once() {
    let (client, store) = mock_only_client();
    let client = Arc::new(client);
    let keywords = terms(&["rust"]);

    let calls = (0..16).map(|_| {
        let client = client.clone();
        let keywords = keywords.clone();
        async move {
            client
                .get_trend_data_at(&keywords, "United States", TimeRange::Days7, today())
                .await
        }
    });
    let results = join_all(calls).await;

    assert_eq!(results.len(), 16);
    assert!(results.iter().all(|points| points.len() == 1));
    assert_eq!(store.lookup_count(), 1);
}

#[tokio::test]
async fn test_concurrent_first_calls_across_tasks() {
    let (client, store) = mock_only_client();
    let client = Arc::new(client);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .get_keyword_ideas(&[format!("seed {i}")], "United States", 5)
                    .await
            })
        })
        .collect();

    for handle in handles {
        let ideas = handle.await.unwrap();
        assert_eq!(ideas.len(), 5);
    }
    assert_eq!(store.lookup_count(), 1);
}
