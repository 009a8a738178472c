mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trendlens::trends::TimeRange;
use trendlens::utils::split_terms;

use commands::StoreParams;

#[derive(Parser)]
#[command(
    name = "trendlens",
    version,
    about = "Keyword and trend research with DataForSEO and mock fallback",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (environment variables are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the research API server
    Serve {
        /// Bind address override (host:port)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Fetch trend series for keywords
    Trends {
        /// Comma-separated keywords
        #[arg(short, long)]
        keywords: String,

        /// Location name (defaults to the configured location)
        #[arg(short, long)]
        location: Option<String>,

        /// Time range (7d, 30d, 90d, 12m, 5y)
        #[arg(short, long, default_value = "12m")]
        range: TimeRange,
    },

    /// Fetch keywords related to seed keywords
    Related {
        /// Comma-separated seed keywords
        #[arg(short, long)]
        keywords: String,

        #[arg(short, long)]
        location: Option<String>,

        /// Search depth (0-4)
        #[arg(short, long, default_value = "1")]
        depth: u8,
    },

    /// Fetch keyword ideas for seed keywords
    Ideas {
        /// Comma-separated seed keywords
        #[arg(short, long)]
        keywords: String,

        #[arg(short, long)]
        location: Option<String>,

        /// Maximum number of ideas
        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Normalize and store keyword rows from a JSON file
    Store {
        /// JSON file holding an array of keyword rows
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        topic_id: Option<String>,

        #[arg(long)]
        user_id: Option<String>,

        /// Source tag for rows without one
        #[arg(long)]
        source: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!("trendlens starting");

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(bind = ?bind, "Starting serve command");
            commands::serve(config, bind).await?;
        }

        Commands::Trends {
            keywords,
            location,
            range,
        } => {
            tracing::info!(keywords = %keywords, location = ?location, range = %range, "Starting trends command");
            commands::trends(&config, split_terms(&keywords), location, range).await?;
        }

        Commands::Related {
            keywords,
            location,
            depth,
        } => {
            tracing::info!(keywords = %keywords, location = ?location, depth = %depth, "Starting related command");
            commands::related(&config, split_terms(&keywords), location, depth).await?;
        }

        Commands::Ideas {
            keywords,
            location,
            limit,
        } => {
            tracing::info!(keywords = %keywords, location = ?location, limit = %limit, "Starting ideas command");
            commands::ideas(&config, split_terms(&keywords), location, limit).await?;
        }

        Commands::Store {
            file,
            topic_id,
            user_id,
            source,
        } => {
            tracing::info!(file = %file.display(), topic_id = ?topic_id, user_id = ?user_id, "Starting store command");
            commands::store(
                &config,
                StoreParams {
                    file,
                    topic_id,
                    user_id,
                    source,
                },
            )
            .await?;
        }
    }

    tracing::info!("trendlens completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("trendlens=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(format!("trendlens={level},warn")))?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
