//! Prometheus metrics for trendlens
//!
//! Tracks provider round trips, mock fallbacks, keyword batches and HTTP
//! requests.
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

struct ResearchMetrics {
    provider_requests: CounterVec,
    provider_duration: HistogramVec,
    fallbacks: CounterVec,
    keyword_records: CounterVec,
    batches: CounterVec,
    api_requests: CounterVec,
    api_duration: HistogramVec,
}

static METRICS: OnceLock<ResearchMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = trendlens::metrics::init_metrics() {
///     tracing::warn!("Metrics initialization failed: {e}");
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = ResearchMetrics {
        provider_requests: register_counter_vec!(
            "trendlens_provider_requests_total",
            "Provider requests by endpoint and outcome",
            &["endpoint", "outcome"]
        )?,
        provider_duration: register_histogram_vec!(
            "trendlens_provider_request_duration_seconds",
            "Provider round trip duration in seconds",
            &["endpoint"],
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
        )?,
        fallbacks: register_counter_vec!(
            "trendlens_mock_fallbacks_total",
            "Responses served from the mock generator by operation and reason",
            &["operation", "reason"]
        )?,
        keyword_records: register_counter_vec!(
            "trendlens_keyword_records_total",
            "Keyword records by batch outcome (stored, rejected, failed)",
            &["outcome"]
        )?,
        batches: register_counter_vec!(
            "trendlens_keyword_batches_total",
            "Keyword batches submitted to the sink by result",
            &["result"]
        )?,
        api_requests: register_counter_vec!(
            "trendlens_api_requests_total",
            "HTTP API requests by route and status",
            &["route", "status"]
        )?,
        api_duration: register_histogram_vec!(
            "trendlens_api_request_duration_seconds",
            "HTTP API request duration in seconds",
            &["route"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    METRICS
        .set(metrics)
        .map_err(|_| "Metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record one provider round trip
pub fn record_provider_request(endpoint: &str, outcome: &str, duration_secs: f64) {
    let Some(m) = METRICS.get() else {
        return;
    };

    m.provider_requests
        .with_label_values(&[endpoint, outcome])
        .inc();
    m.provider_duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Record a response served from mock data
pub fn record_fallback(operation: &str, reason: &str) {
    if let Some(m) = METRICS.get() {
        m.fallbacks.with_label_values(&[operation, reason]).inc();
    }
}

/// Record the outcome of one keyword batch
pub fn record_batch(stored: usize, rejected: usize, persisted: bool) {
    let Some(m) = METRICS.get() else {
        return;
    };

    let result = if persisted { "persisted" } else { "failed" };
    m.batches.with_label_values(&[result]).inc();

    let stored_outcome = if persisted { "stored" } else { "failed" };
    if stored > 0 {
        m.keyword_records
            .with_label_values(&[stored_outcome])
            .inc_by(stored as f64);
    }
    if rejected > 0 {
        m.keyword_records
            .with_label_values(&["rejected"])
            .inc_by(rejected as f64);
    }
}

/// Record an HTTP API request
pub fn record_api_request(route: &str, status: u16, duration_secs: f64) {
    let Some(m) = METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.api_requests
        .with_label_values(&[route, &status_str])
        .inc();
    m.api_duration
        .with_label_values(&[route])
        .observe(duration_secs);
}
