//! Provider response fixtures
//!
//! Builders for DataForSEO `live` envelopes, shaped like real responses but
//! trimmed to the fields the client reads.

use chrono::NaiveDate;
use serde_json::{json, Value};
use trendlens::trends::TimeRange;

pub const TRENDS_PATH: &str = "/v3/keywords_data/google_trends/explore/live";
pub const RELATED_PATH: &str = "/v3/dataforseo_labs/google/related_keywords/live";
pub const IDEAS_PATH: &str = "/v3/dataforseo_labs/google/keyword_ideas/live";

/// Wrap task results in a successful envelope
pub fn envelope(results: Vec<Value>) -> Value {
    json!({
        "version": "0.1.20240801",
        "status_code": 20000,
        "status_message": "Ok.",
        "tasks_count": 1,
        "tasks_error": 0,
        "tasks": [{
            "id": "08011234-1535-0066-0000-a1b2c3d4e5f6",
            "status_code": 20000,
            "status_message": "Ok.",
            "result_count": results.len(),
            "result": results
        }]
    })
}

/// Envelope whose only task failed
pub fn failed_task(status_code: u32, message: &str) -> Value {
    json!({
        "status_code": 20000,
        "status_message": "Ok.",
        "tasks": [{
            "status_code": status_code,
            "status_message": message,
            "result": null
        }]
    })
}

/// Trends result with one graph sample per period of `range`, a region map
/// and related queries for every keyword
///
/// Keyword `k` scores `20 + 10 * (i % 3) + k` in period `i`.
pub fn trends_result(keywords: &[&str], range: TimeRange, today: NaiveDate) -> Value {
    trends_result_over(keywords, &range.period_starts(today))
}

/// Trends result whose graph has a sample at each of `dates`
pub fn trends_result_over(keywords: &[&str], dates: &[NaiveDate]) -> Value {
    let samples: Vec<Value> = dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            let values: Vec<Value> = (0..keywords.len())
                .map(|k| json!(20 + 10 * (i % 3) as u32 + k as u32))
                .collect();
            json!({"date_from": date, "date_to": date, "timestamp": 0, "values": values})
        })
        .collect();

    let regions: Vec<Value> = ["California", "Texas"]
        .iter()
        .map(|geo| json!({"geo_name": geo, "geo_id": "US-XX", "values": vec![55; keywords.len()]}))
        .collect();

    json!({
        "keywords": keywords,
        "location_code": 2840,
        "items_count": 3,
        "items": [
            {"type": "google_trends_graph", "position": 1, "keywords": keywords, "data": samples},
            {"type": "google_trends_map", "position": 2, "keywords": keywords, "data": regions},
            {
                "type": "google_trends_queries_list",
                "position": 3,
                "keywords": keywords,
                "data": {
                    "top": [{"query": "best deals", "value": 100}],
                    "rising": [{"query": "near me", "value": 250}]
                }
            }
        ]
    })
}

/// Labs item in the nested `related_keywords` shape
pub fn related_item(keyword: &str, volume: u64, competition: f64, intent: &str) -> Value {
    json!({
        "se_type": "google",
        "depth": 1,
        "keyword_data": {
            "keyword": keyword,
            "keyword_info": {
                "search_volume": volume,
                "cpc": 1.25,
                "competition": competition,
                "competition_level": "MEDIUM"
            },
            "keyword_properties": {"keyword_difficulty": 41},
            "search_intent_info": {"main_intent": intent}
        }
    })
}

/// Labs item in the inline `keyword_ideas` shape
pub fn idea_item(keyword: &str, volume: u64) -> Value {
    json!({
        "se_type": "google",
        "keyword": keyword,
        "keyword_info": {"search_volume": volume, "cpc": null, "competition": 0.12},
        "keyword_properties": {"keyword_difficulty": 8}
    })
}

pub fn labs_result(items: Vec<Value>) -> Value {
    json!({"items_count": items.len(), "items": items})
}
