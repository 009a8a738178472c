//! Request tasks and response mapping for the DataForSEO endpoints
//!
//! Trends responses are split into typed items (`google_trends_graph`,
//! `google_trends_map`, `google_trends_queries_list`) and folded into one
//! [`TrendDataPoint`] per requested keyword. Labs responses (related keywords,
//! keyword ideas) are folded into [`KeywordMetrics`].

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ProviderError;
use crate::models::{
    CompetitionLevel, DataSource, KeywordMetrics, KeywordSource, SearchIntent, TrendDataPoint,
    TrendPoint,
};
use crate::trends::range::{DateWindow, TimeRange};

/// Trends explore accepts at most this many keywords per task
pub const TRENDS_MAX_KEYWORDS_PER_TASK: usize = 5;

/// Related queries kept per keyword
const MAX_RELATED_QUERIES: usize = 10;

// ============================================================================
// Trends Explore
// ============================================================================

/// One `google_trends/explore/live` task
#[derive(Debug, Clone, Serialize)]
pub struct TrendsExploreTask {
    pub keywords: Vec<String>,
    pub location_name: String,
    pub date_from: String,
    pub date_to: String,
    #[serde(rename = "type")]
    pub search_type: &'static str,
    pub item_types: Vec<&'static str>,
}

/// Build the task array for a keyword set, splitting at the per-task limit
pub fn build_trends_tasks(
    keywords: &[String],
    location: &str,
    window: DateWindow,
) -> Vec<TrendsExploreTask> {
    keywords
        .chunks(TRENDS_MAX_KEYWORDS_PER_TASK)
        .map(|chunk| TrendsExploreTask {
            keywords: chunk.to_vec(),
            location_name: location.to_string(),
            date_from: window.from.format("%Y-%m-%d").to_string(),
            date_to: window.to.format("%Y-%m-%d").to_string(),
            search_type: "web",
            item_types: vec![
                "google_trends_graph",
                "google_trends_map",
                "google_trends_queries_list",
            ],
        })
        .collect()
}

/// One entry of a trends task `result`
#[derive(Debug, Deserialize)]
pub struct TrendsExploreResult {
    #[serde(default)]
    pub items: Option<Vec<TrendsItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum TrendsItem {
    #[serde(rename = "google_trends_graph")]
    Graph {
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default)]
        data: Vec<GraphSample>,
    },
    #[serde(rename = "google_trends_map")]
    Map {
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default)]
        data: Vec<MapSample>,
    },
    #[serde(rename = "google_trends_queries_list")]
    Queries {
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default)]
        data: Option<QueriesData>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct GraphSample {
    pub date_from: NaiveDate,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct MapSample {
    #[serde(default)]
    pub geo_name: Option<String>,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueriesData {
    #[serde(default)]
    pub top: Vec<QueryEntry>,
    #[serde(default)]
    pub rising: Vec<QueryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct QueryEntry {
    pub query: String,
}

fn interest(value: Option<f64>) -> u32 {
    value.unwrap_or(0.0).clamp(0.0, 100.0).round() as u32
}

/// Fold trends results into one point per requested keyword, in request order
///
/// Samples are averaged into the periods of `range` relative to `today`, so a
/// live series has the same length as a mock one whatever granularity the
/// provider answered with. A requested keyword without samples in every
/// period fails the whole response.
pub fn parse_trends(
    endpoint: &str,
    requested: &[String],
    range: TimeRange,
    today: NaiveDate,
    results: Vec<TrendsExploreResult>,
) -> Result<Vec<TrendDataPoint>, ProviderError> {
    let mut series: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();
    let mut geo: HashMap<String, BTreeMap<String, u32>> = HashMap::new();
    let mut queries: HashMap<String, Vec<String>> = HashMap::new();

    for item in results.into_iter().flat_map(|r| r.items.unwrap_or_default()) {
        match item {
            TrendsItem::Graph { keywords, data } => {
                for sample in data {
                    for (idx, keyword) in keywords.iter().enumerate() {
                        let value = sample.values.get(idx).copied().flatten().unwrap_or(0.0);
                        series
                            .entry(keyword.to_lowercase())
                            .or_default()
                            .push((sample.date_from, value));
                    }
                }
            }
            TrendsItem::Map { keywords, data } => {
                for sample in data {
                    let Some(region) = sample.geo_name else {
                        continue;
                    };
                    for (idx, keyword) in keywords.iter().enumerate() {
                        let value = interest(sample.values.get(idx).copied().flatten());
                        geo.entry(keyword.to_lowercase())
                            .or_default()
                            .insert(region.clone(), value);
                    }
                }
            }
            TrendsItem::Queries { keywords, data } => {
                let data = data.unwrap_or_default();
                let terms: Vec<String> = data
                    .top
                    .into_iter()
                    .chain(data.rising)
                    .map(|q| q.query)
                    .collect();
                for keyword in keywords {
                    let list = queries.entry(keyword.to_lowercase()).or_default();
                    for term in &terms {
                        if list.len() < MAX_RELATED_QUERIES && !list.contains(term) {
                            list.push(term.clone());
                        }
                    }
                }
            }
            TrendsItem::Other => {}
        }
    }

    let starts = range.period_starts(today);
    let end = range.window(today).to;

    requested
        .iter()
        .map(|keyword| -> Result<TrendDataPoint, ProviderError> {
            let key = keyword.to_lowercase();
            let samples = series.remove(&key).unwrap_or_default();
            if samples.is_empty() {
                return Err(ProviderError::payload(
                    endpoint,
                    format!("no time series for keyword '{keyword}'"),
                ));
            }

            let points = bucket_samples(&samples, &starts, end).map_err(|start| {
                ProviderError::payload(
                    endpoint,
                    format!("no samples for keyword '{keyword}' in period starting {start}"),
                )
            })?;

            let point = TrendDataPoint::from_series(keyword.clone(), points, DataSource::Live)
                .ok_or_else(|| {
                    ProviderError::payload(endpoint, format!("no time series for keyword '{keyword}'"))
                })?;

            Ok(point
                .with_geographic_data(geo.remove(&key).unwrap_or_default())
                .with_related_queries(queries.remove(&key).unwrap_or_default()))
        })
        .collect()
}

/// Average `samples` into one point per period
///
/// Period `i` covers `[starts[i], starts[i + 1])`; the last one runs through
/// `end`. Samples outside the window are ignored. Returns the start of the
/// first period without samples.
fn bucket_samples(
    samples: &[(NaiveDate, f64)],
    starts: &[NaiveDate],
    end: NaiveDate,
) -> Result<Vec<TrendPoint>, NaiveDate> {
    starts
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let in_period = |date: NaiveDate| match starts.get(idx + 1) {
                Some(&next) => date >= start && date < next,
                None => date >= start && date <= end,
            };
            let (sum, count) = samples
                .iter()
                .filter(|(date, _)| in_period(*date))
                .fold((0.0_f64, 0u32), |(sum, count), (_, value)| (sum + *value, count + 1));

            if count == 0 {
                return Err(start);
            }
            Ok(TrendPoint::new(start, interest(Some(sum / f64::from(count)))))
        })
        .collect()
}

// ============================================================================
// DataForSEO Labs (related keywords, keyword ideas)
// ============================================================================

/// One `related_keywords/live` task
#[derive(Debug, Clone, Serialize)]
pub struct RelatedKeywordsTask {
    pub keyword: String,
    pub location_name: String,
    pub language_code: String,
    pub depth: u8,
    pub limit: u32,
}

/// One `keyword_ideas/live` task
#[derive(Debug, Clone, Serialize)]
pub struct KeywordIdeasTask {
    pub keywords: Vec<String>,
    pub location_name: String,
    pub language_code: String,
    pub limit: u32,
}

/// One entry of a labs task `result`
#[derive(Debug, Deserialize)]
pub struct LabsResult {
    #[serde(default)]
    pub items: Option<Vec<LabsItem>>,
}

/// Labs item; related keywords nest the data under `keyword_data`,
/// keyword ideas carry it inline.
#[derive(Debug, Deserialize)]
pub struct LabsItem {
    #[serde(default)]
    pub keyword_data: Option<LabsKeywordData>,
    #[serde(flatten)]
    pub inline: LabsKeywordData,
}

#[derive(Debug, Default, Deserialize)]
pub struct LabsKeywordData {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub keyword_info: Option<KeywordInfo>,
    #[serde(default)]
    pub keyword_properties: Option<KeywordProperties>,
    #[serde(default)]
    pub search_intent_info: Option<SearchIntentInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeywordInfo {
    #[serde(default)]
    pub search_volume: Option<f64>,
    #[serde(default)]
    pub cpc: Option<f64>,
    #[serde(default)]
    pub competition: Option<f64>,
    #[serde(default)]
    pub competition_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KeywordProperties {
    #[serde(default)]
    pub keyword_difficulty: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchIntentInfo {
    #[serde(default)]
    pub main_intent: Option<String>,
}

impl LabsKeywordData {
    fn into_metrics(self, source: KeywordSource) -> Option<KeywordMetrics> {
        let keyword = self.keyword?.trim().to_string();
        if keyword.is_empty() {
            return None;
        }

        let info = self.keyword_info.unwrap_or_default();
        let difficulty = self
            .keyword_properties
            .and_then(|p| p.keyword_difficulty)
            .unwrap_or(0.0);

        Some(KeywordMetrics {
            keyword,
            search_volume: info.search_volume.unwrap_or(0.0).max(0.0).round() as u64,
            cpc: info.cpc.unwrap_or(0.0).max(0.0),
            competition: info.competition.unwrap_or(0.0).clamp(0.0, 1.0),
            competition_level: info
                .competition_level
                .as_deref()
                .and_then(CompetitionLevel::parse),
            keyword_difficulty: difficulty.clamp(0.0, 100.0).round() as u8,
            main_intent: self
                .search_intent_info
                .and_then(|i| i.main_intent)
                .as_deref()
                .and_then(SearchIntent::parse),
            source,
            provenance: DataSource::Live,
        })
    }
}

/// Fold labs results into keyword metrics, dropping duplicates and nameless items
pub fn parse_keyword_metrics(
    endpoint: &str,
    source: KeywordSource,
    results: Vec<LabsResult>,
) -> Result<Vec<KeywordMetrics>, ProviderError> {
    let mut seen = HashSet::new();
    let metrics: Vec<KeywordMetrics> = results
        .into_iter()
        .flat_map(|r| r.items.unwrap_or_default())
        .filter_map(|item| item.keyword_data.unwrap_or(item.inline).into_metrics(source))
        .filter(|m| seen.insert(m.keyword.to_lowercase()))
        .collect();

    if metrics.is_empty() {
        return Err(ProviderError::EmptyResult {
            endpoint: endpoint.to_string(),
        });
    }

    Ok(metrics)
}

// ============================================================================
// Tests
// ============================================================================
