// Core data structures for trendlens

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a piece of research data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Returned by the live provider
    Live,
    /// Produced locally by the mock generator
    Mock,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
        }
    }
}

/// Single sample of a trend time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Normalized interest score (0-100)
    pub value: u32,
}

impl TrendPoint {
    pub fn new(date: NaiveDate, value: u32) -> Self {
        Self { date, value }
    }
}

/// Trend metrics for one keyword
///
/// A point is only ever built from a non-empty series, so callers never see
/// a keyword with missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendDataPoint {
    pub keyword: String,
    pub time_series: Vec<TrendPoint>,
    pub average_interest: f64,
    pub peak_interest: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geographic_data: Option<BTreeMap<String, u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_queries: Option<Vec<String>>,
    pub source: DataSource,
}

impl TrendDataPoint {
    /// Build a point from a chronological series, deriving the summaries.
    ///
    /// Returns `None` for an empty series.
    pub fn from_series(
        keyword: impl Into<String>,
        time_series: Vec<TrendPoint>,
        source: DataSource,
    ) -> Option<Self> {
        let peak_interest = time_series.iter().map(|p| p.value).max()?;
        let total: u64 = time_series.iter().map(|p| u64::from(p.value)).sum();
        let mean = total as f64 / time_series.len() as f64;

        Some(Self {
            keyword: keyword.into(),
            time_series,
            average_interest: (mean * 100.0).round() / 100.0,
            peak_interest,
            geographic_data: None,
            related_queries: None,
            source,
        })
    }

    #[must_use]
    pub fn with_geographic_data(mut self, data: BTreeMap<String, u32>) -> Self {
        self.geographic_data = (!data.is_empty()).then_some(data);
        self
    }

    #[must_use]
    pub fn with_related_queries(mut self, queries: Vec<String>) -> Self {
        self.related_queries = (!queries.is_empty()).then_some(queries);
        self
    }
}

/// Search intent classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchIntent {
    Informational,
    Commercial,
    Transactional,
    Navigational,
}

impl SearchIntent {
    /// Parse an intent, ignoring case and surrounding whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INFORMATIONAL" => Some(Self::Informational),
            "COMMERCIAL" => Some(Self::Commercial),
            "TRANSACTIONAL" => Some(Self::Transactional),
            "NAVIGATIONAL" => Some(Self::Navigational),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "INFORMATIONAL",
            Self::Commercial => "COMMERCIAL",
            Self::Transactional => "TRANSACTIONAL",
            Self::Navigational => "NAVIGATIONAL",
        }
    }

    pub fn all() -> [Self; 4] {
        [
            Self::Informational,
            Self::Commercial,
            Self::Transactional,
            Self::Navigational,
        ]
    }
}

/// Advertiser competition bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

impl CompetitionLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// Upstream operation that produced a keyword row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeywordSource {
    KeywordIdeas,
    RelatedKeywords,
    SearchVolume,
    #[default]
    Manual,
}

impl KeywordSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyword_ideas" => Some(Self::KeywordIdeas),
            "related_keywords" => Some(Self::RelatedKeywords),
            "search_volume" => Some(Self::SearchVolume),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeywordIdeas => "keyword_ideas",
            Self::RelatedKeywords => "related_keywords",
            Self::SearchVolume => "search_volume",
            Self::Manual => "manual",
        }
    }
}

/// Scale a decimal competition score (0.0-1.0) to its 0-100 integer form
pub fn competition_value_from(competition: f64) -> u8 {
    (competition.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Keyword metrics as returned by the provider (or the mock generator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    pub keyword: String,
    pub search_volume: u64,
    pub cpc: f64,
    pub competition: f64,
    pub competition_level: Option<CompetitionLevel>,
    pub keyword_difficulty: u8,
    pub main_intent: Option<SearchIntent>,
    pub source: KeywordSource,
    pub provenance: DataSource,
}

impl KeywordMetrics {
    pub fn competition_value(&self) -> u8 {
        competition_value_from(self.competition)
    }

    /// Attach ownership and turn the metrics into a storable record
    pub fn into_record(self, topic_id: impl Into<String>, user_id: impl Into<String>) -> KeywordRecord {
        KeywordRecord {
            keyword: self.keyword,
            search_volume: self.search_volume,
            cpc: self.cpc,
            competition: self.competition,
            competition_level: self.competition_level,
            keyword_difficulty: self.keyword_difficulty,
            main_intent: self.main_intent,
            source: self.source,
            topic_id: topic_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Normalized keyword row ready for persistence
///
/// Only the decimal `competition` is stored; `competition_value` is always
/// derived from it so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub search_volume: u64,
    pub cpc: f64,
    pub competition: f64,
    pub competition_level: Option<CompetitionLevel>,
    pub keyword_difficulty: u8,
    pub main_intent: Option<SearchIntent>,
    pub source: KeywordSource,
    pub topic_id: String,
    pub user_id: String,
}

impl KeywordRecord {
    pub fn competition_value(&self) -> u8 {
        competition_value_from(self.competition)
    }
}
