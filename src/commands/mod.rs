pub mod research;
pub mod serve;
pub mod store;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use trendlens::config::Config;

// Re-export command functions for convenience
pub use research::{ideas, related, trends};
pub use serve::serve;
pub use store::{store, StoreParams};

/// Load configuration from `path`, or from the environment when absent
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env().context("Failed to read configuration from environment")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{text}");
    Ok(())
}
