use anyhow::{Context, Result};

use trendlens::config::Config;
use trendlens::metrics;
use trendlens::server::{AppState, TrendServer};

/// Start the research API server
pub async fn serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics registry unavailable");
    }

    let state = AppState::build(&config)
        .await
        .context("Failed to build application state")?;
    let server = TrendServer::new(config.server.clone(), state)
        .context("Failed to create research server")?;

    println!("{}", server.info().display());
    println!();
    println!("API Endpoints:");
    println!("  GET  /api/health                                - Health check");
    println!("  GET  /metrics                                   - Prometheus metrics endpoint");
    println!("  GET  /api/v1/trend-analysis/dataforseo          - Trend data for subtopics");
    println!("  POST /api/v1/keyword-research/related-keywords  - Related keywords");
    println!("  POST /api/v1/keyword-research/keyword-ideas     - Keyword ideas");
    println!("  POST /api/v1/keyword-research/store             - Store keyword rows");
    println!();
    println!("Press Ctrl+C to stop.\n");

    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    println!("Research server stopped.");
    Ok(())
}
