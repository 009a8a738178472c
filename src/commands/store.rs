use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use trendlens::config::Config;
use trendlens::keywords::{KeywordBatchService, NormalizationContext};
use trendlens::models::KeywordSource;
use trendlens::storage::create_record_sink;

use super::print_json;

pub struct StoreParams {
    pub file: PathBuf,
    pub topic_id: Option<String>,
    pub user_id: Option<String>,
    pub source: Option<String>,
}

/// Normalize a JSON file of keyword rows and write it to the configured sink
pub async fn store(config: &Config, params: StoreParams) -> Result<()> {
    let StoreParams {
        file,
        topic_id,
        user_id,
        source,
    } = params;

    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read keyword file: {}", file.display()))?;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&content)
        .with_context(|| format!("Expected a JSON array of keyword rows: {}", file.display()))?;

    let default_source = match source.as_deref() {
        Some(raw) => KeywordSource::parse(raw)
            .with_context(|| format!("Unknown keyword source '{raw}'"))?,
        None => KeywordSource::default(),
    };
    let ctx = NormalizationContext {
        topic_id,
        user_id,
        default_source,
    };

    let sink = create_record_sink(&config.storage)
        .await
        .context("Failed to open keyword storage")?;
    let service = KeywordBatchService::new(sink);

    let report = service.save_json_rows(&rows, &ctx).await;
    print_json(&report)?;

    if report.valid() == 0 {
        bail!("No valid keyword records in {}", file.display());
    }
    if !report.is_success() {
        bail!(
            "Failed to store keyword records: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
