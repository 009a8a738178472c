//! Keyword record normalization and batch submission
//!
//! Loosely typed keyword rows ([`RawKeywordEntry`]) are normalized one by one
//! into [`KeywordRecord`](crate::models::KeywordRecord)s; invalid rows are
//! rejected individually and the valid rest is submitted to the sink as one
//! batch.

pub mod batch;
pub mod normalize;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{ErrorCategory, TrendlensErrorTrait};

pub use batch::{BatchReport, KeywordBatchService, RejectedRecord};
pub use normalize::{normalize_entry, NormalizationContext};

/// Keyword row as received from an API caller or an upstream response
///
/// Every field is optional and untyped. Numbers may be JSON numbers or numeric
/// strings, enumerations may use any case, unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawKeywordEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_volume: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_level: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_difficulty: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_intent: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
}

impl RawKeywordEntry {
    /// Entry with only a keyword set
    pub fn with_keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(Value::String(keyword.into())),
            ..Self::default()
        }
    }

    /// Entry from one element of a JSON array
    ///
    /// Anything but an object is rejected for that element alone.
    pub fn from_json(value: &Value) -> Result<Self, RecordValidationError> {
        if !value.is_object() {
            return Err(RecordValidationError::NotAnObject(json_kind(value)));
        }
        Self::deserialize(value).map_err(|_| RecordValidationError::NotAnObject(json_kind(value)))
    }

    /// Keyword text for reporting, if the entry has a usable one
    pub fn keyword_text(&self) -> Option<String> {
        match self.keyword.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reasons a single keyword row is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    #[error("Row must be a JSON object (got {0})")]
    NotAnObject(&'static str),

    #[error("Keyword is missing or empty")]
    MissingKeyword,

    #[error("Field {field} is not a number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Field {field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("Field {field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown search intent '{0}'")]
    UnknownIntent(String),

    #[error("Unknown competition level '{0}'")]
    UnknownCompetitionLevel(String),

    #[error("Unknown keyword source '{0}'")]
    UnknownSource(String),

    #[error("topic_id is required")]
    MissingTopicId,

    #[error("user_id is required")]
    MissingUserId,
}

impl TrendlensErrorTrait for RecordValidationError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}
