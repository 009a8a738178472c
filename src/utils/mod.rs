//! Common utilities and helper functions
//!
//! Keyword-term cleanup shared by the trends client, the HTTP handlers and the CLI.

use std::collections::HashSet;

use anyhow::{Context, Result};
use url::Url;

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean a list of search terms
///
/// Terms are whitespace-normalized, empty terms dropped, and duplicates removed
/// case-insensitively keeping the first occurrence.
pub fn clean_terms<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .map(|t| normalize_whitespace(t.as_ref()))
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Split a comma-separated list of terms and clean it
pub fn split_terms(csv: &str) -> Vec<String> {
    let parts: Vec<&str> = csv.split(',').collect();
    clean_terms(&parts)
}

/// Check that a string is an absolute http(s) URL
pub fn validate_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => anyhow::bail!("Unsupported URL scheme '{other}' in {url}"),
    }
}

/// Truncate text to at most `max_len` characters, marking the cut with "..."
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
