//! HTTP API integration tests
//!
//! Drive the full router (with the server's layers) against a SQLite sink and
//! a wiremock provider.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use trendlens::config::ServerConfig;
use trendlens::server::{AppState, TrendServer};
use trendlens::storage::SqliteKeywordSink;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{envelope, labs_result, related_item, RELATED_PATH};
use crate::common::{live_client, mock_only_client};

fn router(state: AppState) -> Router {
    TrendServer::new(ServerConfig::default(), state)
        .unwrap()
        .build_router()
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn sqlite_state(temp_dir: &TempDir) -> (AppState, Arc<SqliteKeywordSink>) {
    let sink = Arc::new(SqliteKeywordSink::new(temp_dir.path().join("api.db")).unwrap());
    let (client, _) = mock_only_client();
    (
        AppState::new(Arc::new(client), sink.clone(), "United States"),
        sink,
    )
}

#[tokio::test]
async fn test_store_endpoint_writes_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let (state, sink) = sqlite_state(&temp_dir);

    let (status, body) = call(
        router(state),
        post(
            "/api/v1/keyword-research/store?topic_id=topic-9&user_id=user-9",
            json!([
                {"keyword": "heat pump", "keyword_difficulty": 40, "difficulty": 12},
                {"keyword": "solar panels", "competition": 0.3, "competition_value": 99},
                {"keyword": "geothermal", "competition_level": "extreme"}
            ]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["received"], 3);
    assert_eq!(body["data"]["stored"], 2);
    assert_eq!(body["data"]["rejected"][0]["keyword"], "geothermal");

    let stored = sink.list_by_topic("user-9", "topic-9").unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].record.keyword_difficulty, 40);
    assert_eq!(stored[1].competition_value, 30);
}

#[tokio::test]
async fn test_store_skips_non_object_rows() {
    let temp_dir = TempDir::new().unwrap();
    let (state, sink) = sqlite_state(&temp_dir);

    let (status, body) = call(
        router(state),
        post(
            "/api/v1/keyword-research/store?topic_id=t1&user_id=u1",
            json!([{"keyword": "solar panels"}, {"keyword": "heat pump"}, "junk-row"]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["received"], 3);
    assert_eq!(body["data"]["stored"], 2);
    assert_eq!(body["data"]["rejected"][0]["index"], 2);
    assert_eq!(
        body["data"]["rejected"][0]["reason"],
        "Row must be a JSON object (got string)"
    );
    assert_eq!(sink.list_by_topic("u1", "t1").unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_ids_from_rows() {
    let temp_dir = TempDir::new().unwrap();
    let (state, sink) = sqlite_state(&temp_dir);

    let (status, _) = call(
        router(state),
        post(
            "/api/v1/keyword-research/store",
            json!([
                {"keyword": "heat pump", "topic_id": "t-1", "user_id": "u-1"},
                {"keyword": "solar panels", "topic_id": "t-1"}
            ]),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sink.count().unwrap(), 1);
}

#[tokio::test]
async fn test_store_empty_batch_is_bad_request() {
    let temp_dir = TempDir::new().unwrap();
    let (state, sink) = sqlite_state(&temp_dir);

    let (status, body) = call(
        router(state),
        post("/api/v1/keyword-research/store?topic_id=t&user_id=u", json!([])),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["received"], 0);
    assert_eq!(sink.count().unwrap(), 0);
}

#[tokio::test]
async fn test_store_rejects_non_array_body() {
    let temp_dir = TempDir::new().unwrap();
    let (state, _) = sqlite_state(&temp_dir);

    let (status, _) = call(
        router(state),
        post(
            "/api/v1/keyword-research/store?topic_id=t&user_id=u",
            json!({"keyword": "heat pump"}),
        ),
    )
    .await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_related_keywords_live_through_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELATED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![labs_result(vec![
            related_item("coffee beans", 5400, 0.45, "commercial"),
        ])])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = live_client(&server, Duration::from_secs(5));
    let temp_dir = TempDir::new().unwrap();
    let sink = Arc::new(SqliteKeywordSink::new(temp_dir.path().join("api.db")).unwrap());
    let state = AppState::new(Arc::new(client), sink, "United States");

    let (status, body) = call(
        router(state.clone()),
        post(
            "/api/v1/keyword-research/related-keywords",
            json!({"keywords": ["coffee"], "depth": 2}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["keyword"], "coffee beans");
    assert_eq!(body[0]["competition_value"], 45);
    assert_eq!(body[0]["main_intent"], "COMMERCIAL");
    assert_eq!(body[0]["data_source"], "live");

    let (_, health) = call(
        router(state),
        Request::get("/api/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(health["data"]["provider_mode"], "live");
}

#[tokio::test]
async fn test_trend_analysis_default_range() {
    let temp_dir = TempDir::new().unwrap();
    let (state, _) = sqlite_state(&temp_dir);

    let (status, body) = call(
        router(state),
        Request::get("/api/v1/trend-analysis/dataforseo?subtopics=rust,,go&location=Germany")
            .header(header::AUTHORIZATION, "Bearer token-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert!(points
        .iter()
        .all(|p| p["time_series"].as_array().unwrap().len() == 12));
}
