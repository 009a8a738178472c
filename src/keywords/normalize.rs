//! Per-record normalization of raw keyword rows

use serde_json::Value;

use super::{RawKeywordEntry, RecordValidationError};
use crate::models::{CompetitionLevel, KeywordRecord, KeywordSource, SearchIntent};
use crate::utils::normalize_whitespace;

/// Values supplied by the caller rather than by the rows themselves
///
/// Context ids take precedence over ids found in a row.
#[derive(Debug, Clone, Default)]
pub struct NormalizationContext {
    pub topic_id: Option<String>,
    pub user_id: Option<String>,
    /// Source tag for rows that carry none
    pub default_source: KeywordSource,
}

impl NormalizationContext {
    pub fn new(topic_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            topic_id: Some(topic_id.into()),
            user_id: Some(user_id.into()),
            default_source: KeywordSource::Manual,
        }
    }

    pub fn with_default_source(mut self, source: KeywordSource) -> Self {
        self.default_source = source;
        self
    }
}

/// Normalize one raw row into a storable record
///
/// Rules:
/// - `keyword` is whitespace-normalized and must be non-empty
/// - `keyword_difficulty` wins over `difficulty` when both are present
/// - `competition` (0-1) is canonical; `competition_value` (0-100) only fills
///   in when the decimal is absent; neither means 0
/// - `main_intent` wins over `intent_type`; enumerations are case-insensitive
/// - numbers may be JSON numbers or numeric strings; missing numbers are 0
pub fn normalize_entry(
    entry: &RawKeywordEntry,
    ctx: &NormalizationContext,
) -> Result<KeywordRecord, RecordValidationError> {
    let keyword = entry
        .keyword
        .as_ref()
        .and_then(text)
        .map(|k| normalize_whitespace(&k))
        .filter(|k| !k.is_empty())
        .ok_or(RecordValidationError::MissingKeyword)?;

    let search_volume = non_negative("search_volume", &entry.search_volume)?
        .map(|v| v.round() as u64)
        .unwrap_or(0);
    let cpc = non_negative("cpc", &entry.cpc)?.unwrap_or(0.0);

    let competition = match bounded("competition", &entry.competition, 1.0)? {
        Some(decimal) => decimal,
        None => bounded("competition_value", &entry.competition_value, 100.0)?
            .map(|scaled| scaled.round() / 100.0)
            .unwrap_or(0.0),
    };

    let difficulty = match bounded("keyword_difficulty", &entry.keyword_difficulty, 100.0)? {
        Some(d) => Some(d),
        None => bounded("difficulty", &entry.difficulty, 100.0)?,
    };
    let keyword_difficulty = difficulty.map(|d| d.round() as u8).unwrap_or(0);

    let main_intent = match first_present(&entry.main_intent, &entry.intent_type) {
        Some(raw) => Some(
            SearchIntent::parse(&raw).ok_or(RecordValidationError::UnknownIntent(raw))?,
        ),
        None => None,
    };

    let competition_level = match entry.competition_level.as_ref().and_then(text) {
        Some(raw) => Some(
            CompetitionLevel::parse(&raw)
                .ok_or(RecordValidationError::UnknownCompetitionLevel(raw))?,
        ),
        None => None,
    };

    let source = match entry.source.as_ref().and_then(text) {
        Some(raw) => KeywordSource::parse(&raw).ok_or(RecordValidationError::UnknownSource(raw))?,
        None => ctx.default_source,
    };

    let topic_id = ctx
        .topic_id
        .clone()
        .or_else(|| entry.topic_id.as_ref().and_then(text))
        .ok_or(RecordValidationError::MissingTopicId)?;
    let user_id = ctx
        .user_id
        .clone()
        .or_else(|| entry.user_id.as_ref().and_then(text))
        .ok_or(RecordValidationError::MissingUserId)?;

    Ok(KeywordRecord {
        keyword,
        search_volume,
        cpc,
        competition,
        competition_level,
        keyword_difficulty,
        main_intent,
        source,
        topic_id,
        user_id,
    })
}

/// Trimmed, non-empty text from a string or number value
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_present(primary: &Option<Value>, secondary: &Option<Value>) -> Option<String> {
    primary
        .as_ref()
        .and_then(text)
        .or_else(|| secondary.as_ref().and_then(text))
}

/// Finite number from a JSON number or numeric string; null and "" are absent
fn number(field: &'static str, value: &Option<Value>) -> Result<Option<f64>, RecordValidationError> {
    let invalid = |v: &Value| RecordValidationError::InvalidNumber {
        field,
        value: v.to_string(),
    };

    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v @ Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(v))?,
        Some(v @ Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>().map_err(|_| invalid(v))?
        }
        Some(v) => return Err(invalid(v)),
    };

    if !parsed.is_finite() {
        return Err(RecordValidationError::InvalidNumber {
            field,
            value: parsed.to_string(),
        });
    }
    Ok(Some(parsed))
}

fn non_negative(
    field: &'static str,
    value: &Option<Value>,
) -> Result<Option<f64>, RecordValidationError> {
    match number(field, value)? {
        Some(v) if v < 0.0 => Err(RecordValidationError::Negative { field, value: v }),
        other => Ok(other),
    }
}

fn bounded(
    field: &'static str,
    value: &Option<Value>,
    max: f64,
) -> Result<Option<f64>, RecordValidationError> {
    match number(field, value)? {
        Some(v) if !(0.0..=max).contains(&v) => Err(RecordValidationError::OutOfRange {
            field,
            value: v,
            min: 0.0,
            max,
        }),
        other => Ok(other),
    }
}
