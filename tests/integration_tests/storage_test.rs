//! SQLite-backed storage integration tests
//!
//! Batches go through normalization into a file database, and credentials
//! stored in SQLite drive the client into live mode.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use trendlens::config::{Config, CredentialSource, StorageBackend, StorageConfig};
use trendlens::keywords::{KeywordBatchService, NormalizationContext, RawKeywordEntry};
use trendlens::models::{DataSource, KeywordSource, SearchIntent};
use trendlens::storage::{
    create_credential_store, create_record_sink, SqliteCredentialStore, SqliteKeywordSink,
};
use trendlens::trends::{TimeRange, TrendClientConfig, TrendDataClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{envelope, trends_result, TRENDS_PATH};
use crate::common::{credential_for, terms};

fn rows(value: serde_json::Value) -> Vec<RawKeywordEntry> {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_batch_persists_to_sqlite_file() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("research.db");

    let sink = Arc::new(SqliteKeywordSink::new(&db_path).unwrap());
    let service = KeywordBatchService::new(sink.clone());
    let ctx = NormalizationContext::new("topic-1", "user-1");

    let report = service
        .save_keyword_data_batch(
            &rows(json!([
                {"keyword": " solar   panels ", "search_volume": "1200", "competition": 0.3},
                {"keyword": "heat pump", "competition_value": 30, "intent_type": "informational"},
                {"keyword": "geothermal", "cpc": "not a price"}
            ])),
            &ctx,
        )
        .await;

    assert!(report.is_success());
    assert_eq!(report.stored, 2);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].keyword.as_deref(), Some("geothermal"));

    // Reopen the file to make sure the rows were committed
    drop(service);
    drop(sink);
    let reopened = SqliteKeywordSink::new(&db_path).unwrap();
    let stored = reopened.list_by_topic("user-1", "topic-1").unwrap();

    assert_eq!(stored.len(), 2);
    let heat = &stored[0];
    assert_eq!(heat.record.keyword, "heat pump");
    assert_eq!(heat.record.competition, 0.3);
    assert_eq!(heat.record.main_intent, Some(SearchIntent::Informational));

    let solar = &stored[1];
    assert_eq!(solar.record.keyword, "solar panels");
    assert_eq!(solar.record.search_volume, 1200);
    assert_eq!(solar.competition_value, 30);
    assert_eq!(solar.record.source, KeywordSource::Manual);
}

#[tokio::test]
async fn test_resubmitted_batch_upserts() {
    let temp_dir = TempDir::new().unwrap();
    let sink = Arc::new(SqliteKeywordSink::new(temp_dir.path().join("research.db")).unwrap());
    let service = KeywordBatchService::new(sink.clone());
    let ctx = NormalizationContext::new("topic-1", "user-1");

    service
        .save_keyword_data_batch(&rows(json!([{"keyword": "heat pump", "search_volume": 10}])), &ctx)
        .await;
    let report = service
        .save_keyword_data_batch(&rows(json!([{"keyword": "heat pump", "search_volume": 99}])), &ctx)
        .await;

    assert!(report.is_success());
    assert_eq!(sink.count().unwrap(), 1);
    let stored = sink.list_by_topic("user-1", "topic-1").unwrap();
    assert_eq!(stored[0].record.search_volume, 99);
}

#[tokio::test]
async fn test_keyword_case_upserts_across_batches() {
    let temp_dir = TempDir::new().unwrap();
    let sink = Arc::new(SqliteKeywordSink::new(temp_dir.path().join("research.db")).unwrap());
    let service = KeywordBatchService::new(sink.clone());
    let ctx = NormalizationContext::new("topic-1", "user-1");

    service
        .save_keyword_data_batch(&rows(json!([{"keyword": "Solar Panels", "search_volume": 10}])), &ctx)
        .await;
    let report = service
        .save_keyword_data_batch(&rows(json!([{"keyword": "solar panels", "search_volume": 99}])), &ctx)
        .await;

    assert!(report.is_success());
    assert_eq!(sink.count().unwrap(), 1);
    let stored = sink.list_by_topic("user-1", "topic-1").unwrap();
    assert_eq!(stored[0].record.keyword, "solar panels");
    assert_eq!(stored[0].record.search_volume, 99);
}

#[tokio::test]
async fn test_same_keyword_under_different_topics() {
    let temp_dir = TempDir::new().unwrap();
    let sink = Arc::new(SqliteKeywordSink::new(temp_dir.path().join("research.db")).unwrap());
    let service = KeywordBatchService::new(sink.clone());

    for topic in ["topic-a", "topic-b"] {
        let report = service
            .save_keyword_data_batch(
                &rows(json!([{"keyword": "heat pump"}])),
                &NormalizationContext::new(topic, "user-1"),
            )
            .await;
        assert!(report.is_success());
    }

    assert_eq!(sink.count().unwrap(), 2);
}

#[tokio::test]
async fn test_record_sink_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig {
        backend: StorageBackend::Sqlite,
        sqlite_path: temp_dir.path().join("nested").join("sink.db"),
        ..StorageConfig::default()
    };

    let sink = create_record_sink(&config).await.unwrap();
    let service = KeywordBatchService::new(sink);
    let report = service
        .save_keyword_data_batch(
            &rows(json!([{"keyword": "heat pump"}])),
            &NormalizationContext::new("t", "u"),
        )
        .await;

    assert!(report.is_success());
    assert!(config.sqlite_path.exists());
}

#[tokio::test]
async fn test_sqlite_credentials_enable_live_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TRENDS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![trends_result(
            &["rust"],
            TimeRange::Months12,
            Utc::now().date_naive(),
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("credentials.db");
    SqliteCredentialStore::new(&db_path)
        .unwrap()
        .upsert_credential("dataforseo", &credential_for(&server))
        .unwrap();

    let mut config = Config::default();
    config.credentials.source = CredentialSource::Sqlite;
    config.storage.sqlite_path = db_path;

    let credentials = create_credential_store(&config).unwrap();
    let client = TrendDataClient::new(
        TrendClientConfig {
            timeout: Duration::from_secs(5),
            ..TrendClientConfig::from(&config)
        },
        credentials,
    );

    let points = client
        .get_trend_data(&terms(&["rust"]), "United States", TimeRange::Months12)
        .await;
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].source, DataSource::Live);
    assert_eq!(client.is_live(), Some(true));
}

#[tokio::test]
async fn test_deactivated_sqlite_credential_means_mock() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteCredentialStore::new(temp_dir.path().join("credentials.db")).unwrap();
    store
        .upsert_credential(
            "dataforseo",
            &trendlens::provider::ProviderCredential::new("http://127.0.0.1:1/v3", "a", "b"),
        )
        .unwrap();
    assert_eq!(store.deactivate("DataForSEO").unwrap(), 1);

    let client = TrendDataClient::new(TrendClientConfig::default(), Arc::new(store));
    let points = client
        .get_trend_data(&terms(&["rust"]), "United States", TimeRange::Days7)
        .await;

    assert_eq!(points.len(), 1);
    assert_eq!(client.is_live(), Some(false));
}
