//! Batch submission of keyword rows to a [`TrendRecordSink`]

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::normalize::{normalize_entry, NormalizationContext};
use super::{RawKeywordEntry, RecordValidationError};
use crate::metrics;
use crate::models::{KeywordMetrics, KeywordRecord};
use crate::storage::{SharedRecordSink, TrendRecordSink};

/// A row that failed normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    /// Position in the submitted batch
    pub index: usize,
    pub keyword: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub reason: RecordValidationError,
}

fn serialize_display<S: Serializer>(
    reason: &RecordValidationError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(reason)
}

/// Outcome of one batch submission
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Rows submitted by the caller
    pub received: usize,
    /// Records handed to the sink and confirmed written
    pub stored: usize,
    /// Valid rows folded into a later row with the same keyword
    pub duplicates: usize,
    pub rejected: Vec<RejectedRecord>,
    /// Whether the sink accepted the valid records (true when there were none)
    pub persisted: bool,
    /// Sink failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchReport {
    /// True when every valid record was persisted
    pub fn is_success(&self) -> bool {
        self.persisted
    }

    /// Number of rows that passed normalization
    pub fn valid(&self) -> usize {
        self.received - self.rejected.len()
    }
}

/// Normalizes keyword rows and submits the valid ones as one batch
#[derive(Clone)]
pub struct KeywordBatchService {
    sink: SharedRecordSink,
}

impl KeywordBatchService {
    pub fn new(sink: SharedRecordSink) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &dyn TrendRecordSink {
        self.sink.as_ref()
    }

    /// Normalize `entries` and persist every valid one
    ///
    /// Invalid rows are rejected individually and never block the rest. Rows
    /// that resolve to the same user, topic and keyword (case-insensitive) are
    /// collapsed; the last one wins.
    pub async fn save_keyword_data_batch(
        &self,
        entries: &[RawKeywordEntry],
        ctx: &NormalizationContext,
    ) -> BatchReport {
        let mut report = BatchReport {
            received: entries.len(),
            ..BatchReport::default()
        };

        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            admit(index, entry, ctx, &mut records, &mut report);
        }

        let records = collapse_duplicates(records, &mut report.duplicates);
        self.submit(records, report).await
    }

    /// Like [`save_keyword_data_batch`](Self::save_keyword_data_batch) for a
    /// JSON array whose elements have not been checked yet
    ///
    /// An element that is not an object is rejected on its own.
    pub async fn save_json_rows(&self, rows: &[Value], ctx: &NormalizationContext) -> BatchReport {
        let mut report = BatchReport {
            received: rows.len(),
            ..BatchReport::default()
        };

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match RawKeywordEntry::from_json(row) {
                Ok(entry) => admit(index, &entry, ctx, &mut records, &mut report),
                Err(reason) => reject(&mut report, index, None, reason),
            }
        }

        let records = collapse_duplicates(records, &mut report.duplicates);
        self.submit(records, report).await
    }

    /// Persist provider metrics under one topic and user
    pub async fn save_metrics(
        &self,
        metrics: Vec<KeywordMetrics>,
        topic_id: &str,
        user_id: &str,
    ) -> BatchReport {
        let mut report = BatchReport {
            received: metrics.len(),
            ..BatchReport::default()
        };
        let records = metrics
            .into_iter()
            .map(|m| m.into_record(topic_id, user_id))
            .collect();
        let records = collapse_duplicates(records, &mut report.duplicates);
        self.submit(records, report).await
    }

    async fn submit(&self, records: Vec<KeywordRecord>, mut report: BatchReport) -> BatchReport {
        if records.is_empty() {
            report.persisted = true;
            tracing::info!(
                received = report.received,
                rejected = report.rejected.len(),
                "No valid keyword records to store"
            );
            metrics::record_batch(0, report.rejected.len(), true);
            return report;
        }

        match self.sink.save_batch(&records).await {
            Ok(written) => {
                report.stored = written;
                report.persisted = true;
                tracing::info!(
                    received = report.received,
                    stored = written,
                    rejected = report.rejected.len(),
                    duplicates = report.duplicates,
                    "Keyword batch stored"
                );
            }
            Err(e) => {
                report.persisted = false;
                report.error = Some(e.to_string());
                tracing::error!(
                    received = report.received,
                    valid = records.len(),
                    error = %e,
                    "Keyword batch failed to persist"
                );
            }
        }

        metrics::record_batch(records.len(), report.rejected.len(), report.persisted);
        report
    }
}

fn admit(
    index: usize,
    entry: &RawKeywordEntry,
    ctx: &NormalizationContext,
    records: &mut Vec<KeywordRecord>,
    report: &mut BatchReport,
) {
    match normalize_entry(entry, ctx) {
        Ok(record) => records.push(record),
        Err(reason) => reject(report, index, entry.keyword_text(), reason),
    }
}

fn reject(
    report: &mut BatchReport,
    index: usize,
    keyword: Option<String>,
    reason: RecordValidationError,
) {
    tracing::debug!(index, keyword = ?keyword, %reason, "Keyword row rejected");
    report.rejected.push(RejectedRecord {
        index,
        keyword,
        reason,
    });
}

/// Keep one record per (user, topic, lowercase keyword), in first-seen order,
/// with the contents of the last occurrence
fn collapse_duplicates(records: Vec<KeywordRecord>, duplicates: &mut usize) -> Vec<KeywordRecord> {
    let mut positions: HashMap<(String, String, String), usize> = HashMap::new();
    let mut unique: Vec<KeywordRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = (
            record.user_id.clone(),
            record.topic_id.clone(),
            record.keyword.to_lowercase(),
        );
        match positions.get(&key) {
            Some(&pos) => {
                unique[pos] = record;
                *duplicates += 1;
            }
            None => {
                positions.insert(key, unique.len());
                unique.push(record);
            }
        }
    }

    unique
}
