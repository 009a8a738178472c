use std::sync::Arc;

use anyhow::{Context, Result};

use trendlens::config::Config;
use trendlens::storage::create_credential_store;
use trendlens::trends::{TimeRange, TrendDataClient};

use super::print_json;

fn research_client(config: &Config) -> Result<Arc<TrendDataClient>> {
    let credentials =
        create_credential_store(config).context("Failed to open credential store")?;
    Ok(TrendDataClient::from_config(config, credentials))
}

fn location_or_default(config: &Config, location: Option<String>) -> String {
    location
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| config.provider.default_location.clone())
}

pub async fn trends(
    config: &Config,
    keywords: Vec<String>,
    location: Option<String>,
    range: TimeRange,
) -> Result<()> {
    let client = research_client(config)?;
    let location = location_or_default(config, location);

    let points = client.get_trend_data(&keywords, &location, range).await;
    tracing::info!(points = points.len(), %range, "Trend lookup finished");
    print_json(&points)
}

pub async fn related(
    config: &Config,
    keywords: Vec<String>,
    location: Option<String>,
    depth: u8,
) -> Result<()> {
    let client = research_client(config)?;
    let location = location_or_default(config, location);

    let rows = client.get_related_keywords(&keywords, &location, depth).await;
    tracing::info!(rows = rows.len(), depth, "Related keyword lookup finished");
    print_json(&rows)
}

pub async fn ideas(
    config: &Config,
    keywords: Vec<String>,
    location: Option<String>,
    limit: u32,
) -> Result<()> {
    let client = research_client(config)?;
    let location = location_or_default(config, location);

    let rows = client.get_keyword_ideas(&keywords, &location, limit).await;
    tracing::info!(rows = rows.len(), limit, "Keyword idea lookup finished");
    print_json(&rows)
}
