//! Trend and keyword research
//!
//! - [`client`] - [`TrendDataClient`], live provider calls with whole-response mock fallback
//! - [`range`] - [`TimeRange`] values and the date windows they cover
//! - [`mock`] - deterministic synthetic data keyed by keyword and location

pub mod client;
pub mod mock;
pub mod range;

pub use client::{ClientMode, TrendClientConfig, TrendDataClient};
pub use mock::MockTrendGenerator;
pub use range::{DateWindow, Granularity, InvalidTimeRange, TimeRange};
