//! Integration tests module
//!
//! End-to-end tests for the trendlens research client, batch storage and
//! HTTP API, with wiremock standing in for DataForSEO.

pub mod api_test;
pub mod fallback_scenarios;
pub mod fixtures;
pub mod provider_test;
pub mod storage_test;
