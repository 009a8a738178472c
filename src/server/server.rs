//! Research server wiring
//!
//! The binary builds one [`AppState`] from configuration and hands it to the
//! router; nothing in the server is global.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::api::create_router;
use crate::config::{Config, ServerConfig};
use crate::keywords::KeywordBatchService;
use crate::storage::{create_credential_store, create_record_sink, SharedRecordSink};
use crate::trends::TrendDataClient;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Trend and keyword research client
    pub trends: Arc<TrendDataClient>,

    /// Keyword batch normalization and storage
    pub batches: KeywordBatchService,

    /// Location used when a request omits one
    pub default_location: String,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        trends: Arc<TrendDataClient>,
        sink: SharedRecordSink,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            trends,
            batches: KeywordBatchService::new(sink),
            default_location: default_location.into(),
            start_time: Instant::now(),
        }
    }

    /// Build the client, credential store and sink selected by configuration
    pub async fn build(config: &Config) -> Result<Self, ServerError> {
        let credentials =
            create_credential_store(config).map_err(|e| ServerError::Init(e.to_string()))?;
        let sink = create_record_sink(&config.storage)
            .await
            .map_err(|e| ServerError::Init(e.to_string()))?;
        let trends = TrendDataClient::from_config(config, credentials);

        Ok(Self::new(trends, sink, config.provider.default_location.clone()))
    }
}

// ============================================================================
// Trend Server
// ============================================================================

/// HTTP server for the research API
pub struct TrendServer {
    config: ServerConfig,
    bind_address: SocketAddr,
    state: AppState,
}

impl TrendServer {
    pub fn new(config: ServerConfig, state: AppState) -> Result<Self, ServerError> {
        let bind_address = config
            .bind_address
            .parse::<SocketAddr>()
            .map_err(|e| ServerError::Config(format!("{}: {e}", config.bind_address)))?;

        Ok(Self {
            config,
            bind_address,
            state,
        })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes and configured layers
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(%addr, "Research API listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Research API shutdown complete");
        Ok(())
    }

    pub fn info(&self) -> ServerInfo {
        ServerInfo {
            bind_address: self.bind_address,
            default_location: self.state.default_location.clone(),
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub default_location: String,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "trendlens API\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Default Location: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.default_location,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

#[derive(Error, Debug, Clone)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Failed to bind: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Serve(String),
}

// ============================================================================
// Tests
// ============================================================================
