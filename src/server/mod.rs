//! HTTP surface for trend analysis and keyword research
//!
//! - [`server`] - [`AppState`], [`TrendServer`] and graceful shutdown
//! - [`api`] - routes, handlers and response types

pub mod api;
#[allow(clippy::module_inception)]
pub mod server;

pub use api::{create_router, ApiResponse, ErrorResponse, HealthResponse, KeywordResponse};
pub use server::{AppState, ServerError, ServerInfo, TrendServer};
