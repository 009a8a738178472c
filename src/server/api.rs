//! REST API handlers for trend analysis and keyword research
//!
//! Research endpoints always answer with data; when the provider is down the
//! data is mock. Only the store endpoint reports failures to the caller.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::server::AppState;
use crate::keywords::{BatchReport, NormalizationContext};
use crate::metrics;
use crate::models::{
    CompetitionLevel, DataSource, KeywordMetrics, KeywordSource, SearchIntent, TrendDataPoint,
};
use crate::trends::client::DEFAULT_IDEAS_LIMIT;
use crate::trends::TimeRange;
use crate::utils::{clean_terms, split_terms};

/// Longest accepted topic or user id
const MAX_ID_LEN: usize = 128;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response that still carries data
    pub fn failure(data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(message.into()),
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response()
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// `live`, `mock` or `uninitialized`
    pub provider_mode: String,
}

/// Keyword row returned by the research endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordResponse {
    pub keyword: String,
    pub search_volume: u64,
    pub cpc: f64,
    pub competition: f64,
    pub competition_value: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competition_level: Option<CompetitionLevel>,
    pub keyword_difficulty: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_intent: Option<SearchIntent>,
    pub source: KeywordSource,
    pub data_source: DataSource,
}

impl From<KeywordMetrics> for KeywordResponse {
    fn from(m: KeywordMetrics) -> Self {
        Self {
            competition_value: m.competition_value(),
            keyword: m.keyword,
            search_volume: m.search_volume,
            cpc: m.cpc,
            competition: m.competition,
            competition_level: m.competition_level,
            keyword_difficulty: m.keyword_difficulty,
            main_intent: m.main_intent,
            source: m.source,
            data_source: m.provenance,
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// Comma-separated keywords
    #[serde(default)]
    pub subtopics: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time_range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RelatedKeywordsRequest {
    pub keywords: Vec<String>,
    #[serde(default = "default_depth")]
    pub depth: u8,
    #[serde(default)]
    pub location: Option<String>,
}

fn default_depth() -> u8 {
    1
}

#[derive(Debug, Deserialize)]
pub struct KeywordIdeasRequest {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StoreQuery {
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        .route("/api/v1/trend-analysis/dataforseo", get(trend_analysis))
        .route(
            "/api/v1/keyword-research/related-keywords",
            post(related_keywords),
        )
        .route("/api/v1/keyword-research/keyword-ideas", post(keyword_ideas))
        .route("/api/v1/keyword-research/store", post(store_keywords))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.run(request).await;
    metrics::record_api_request(
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Bearer tokens are accepted but not checked
fn note_caller(headers: &HeaderMap) {
    let has_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer "));
    tracing::trace!(has_bearer, "Request caller");
}

fn location_or_default(state: &AppState, location: Option<String>) -> String {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.default_location.clone())
}

// ============================================================================
// Health Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let provider_mode = match state.trends.is_live() {
        Some(true) => "live",
        Some(false) => "mock",
        None => "uninitialized",
    };

    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        provider_mode: provider_mode.to_string(),
    }))
}

async fn prometheus_metrics() -> Response {
    match metrics::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("Failed to encode metrics: {e}"))),
        )
            .into_response(),
    }
}

// ============================================================================
// Research Handlers
// ============================================================================

/// Trend data for comma-separated `subtopics`
async fn trend_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TrendQuery>,
) -> Response {
    note_caller(&headers);

    let range = match query.time_range.as_deref() {
        Some(raw) if !raw.trim().is_empty() => match raw.parse::<TimeRange>() {
            Ok(range) => range,
            Err(e) => return bad_request(e.to_string()),
        },
        _ => TimeRange::default(),
    };

    let keywords = query.subtopics.as_deref().map(split_terms).unwrap_or_default();
    let location = location_or_default(&state, query.location);

    let points: Vec<TrendDataPoint> = state.trends.get_trend_data(&keywords, &location, range).await;
    Json(points).into_response()
}

async fn related_keywords(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RelatedKeywordsRequest>,
) -> Response {
    note_caller(&headers);

    let keywords = clean_terms(&request.keywords);
    if keywords.is_empty() {
        return bad_request("At least one keyword is required");
    }
    let location = location_or_default(&state, request.location);

    let rows: Vec<KeywordResponse> = state
        .trends
        .get_related_keywords(&keywords, &location, request.depth)
        .await
        .into_iter()
        .map(KeywordResponse::from)
        .collect();
    Json(rows).into_response()
}

async fn keyword_ideas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<KeywordIdeasRequest>,
) -> Response {
    note_caller(&headers);

    let keywords = clean_terms(&request.keywords);
    if keywords.is_empty() {
        return bad_request("At least one keyword is required");
    }
    let location = location_or_default(&state, request.location);
    let limit = request.limit.unwrap_or(DEFAULT_IDEAS_LIMIT);

    let rows: Vec<KeywordResponse> = state
        .trends
        .get_keyword_ideas(&keywords, &location, limit)
        .await
        .into_iter()
        .map(KeywordResponse::from)
        .collect();
    Json(rows).into_response()
}

// ============================================================================
// Storage Handlers
// ============================================================================

fn parse_id(name: &str, raw: Option<String>) -> Result<Option<String>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let id = raw.trim();
    if id.is_empty() || id.len() > MAX_ID_LEN || id.chars().any(char::is_control) {
        return Err(format!("Malformed {name}"));
    }
    Ok(Some(id.to_string()))
}

/// Normalize and store a batch of raw keyword rows
///
/// The body must be a JSON array; each element is checked on its own.
async fn store_keywords(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StoreQuery>,
    Json(rows): Json<Vec<Value>>,
) -> Response {
    note_caller(&headers);

    let ids = parse_id("topic_id", query.topic_id)
        .and_then(|topic| parse_id("user_id", query.user_id).map(|user| (topic, user)));
    let (topic_id, user_id) = match ids {
        Ok(ids) => ids,
        Err(message) => return bad_request(message),
    };

    let ctx = NormalizationContext {
        topic_id,
        user_id,
        ..NormalizationContext::default()
    };
    let report: BatchReport = state.batches.save_json_rows(&rows, &ctx).await;

    if report.valid() == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failure(report, "No valid keyword records")),
        )
            .into_response();
    }

    if !report.is_success() {
        let message = report
            .error
            .clone()
            .unwrap_or_else(|| "Failed to store keyword records".to_string());
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::failure(report, message)),
        )
            .into_response();
    }

    (StatusCode::OK, Json(ApiResponse::success(report))).into_response()
}

// ============================================================================
// Tests
// ============================================================================
