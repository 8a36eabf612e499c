//! Lifecycle of one ingestion run.
//!
//! A [`Batch`] is a plain value. Each transition consumes the previous state
//! and returns the next one, and the caller decides when to publish a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::Tier;
use crate::pipeline::aggregate::BatchStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed { error: String },
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Data rows seen in the document
    pub total_rows: usize,
    /// Rows that became a record
    pub converted_rows: usize,
    /// Records that passed validation
    pub accepted_rows: usize,
    pub rejected_rows: usize,
    /// Rows dropped before synthesis
    pub skipped_rows: usize,
    pub tier_counts: BTreeMap<Tier, usize>,
    pub total_price: f64,
    pub average_price: f64,
    pub total_tags: usize,
}

impl BatchResult {
    pub fn new(total_rows: usize, converted_rows: usize, rejected_rows: usize, stats: BatchStats) -> Self {
        Self {
            total_rows,
            converted_rows,
            accepted_rows: stats.count,
            rejected_rows,
            skipped_rows: total_rows.saturating_sub(converted_rows),
            tier_counts: stats.tier_counts,
            total_price: stats.total_price,
            average_price: stats.average_price,
            total_tags: stats.total_tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub source_filename: String,
    pub status: BatchStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processed_rows: usize,
    pub total_rows: usize,
    pub warnings: Vec<String>,
    pub result: Option<BatchResult>,
}

impl Batch {
    pub fn new(source_filename: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_filename: source_filename.into(),
            status: BatchStatus::Pending,
            started_at: Utc::now(),
            finished_at: None,
            processed_rows: 0,
            total_rows: 0,
            warnings: Vec::new(),
            result: None,
        }
    }

    /// Document parsed; `total_rows` data rows are about to be processed
    pub fn start(self, total_rows: usize) -> Self {
        Self {
            status: BatchStatus::Processing,
            total_rows,
            ..self
        }
    }

    /// One more row handled, with any warnings it produced
    pub fn advance(mut self, warnings: impl IntoIterator<Item = String>) -> Self {
        self.processed_rows += 1;
        self.warnings.extend(warnings);
        self
    }

    pub fn complete(mut self, result: BatchResult, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        Self {
            status: BatchStatus::Completed,
            finished_at: Some(Utc::now()),
            result: Some(result),
            ..self
        }
    }

    /// Terminal failure. Progress made so far is kept as-is.
    pub fn fail(mut self, error: impl ToString, warnings: impl IntoIterator<Item = String>) -> Self {
        self.warnings.extend(warnings);
        Self {
            status: BatchStatus::Failed {
                error: error.to_string(),
            },
            finished_at: Some(Utc::now()),
            ..self
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, BatchStatus::Completed | BatchStatus::Failed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, BatchStatus::Failed { .. })
    }

    /// Fraction of rows processed, in [0,1]
    pub fn progress(&self) -> f64 {
        if self.total_rows == 0 {
            return if self.is_terminal() { 1.0 } else { 0.0 };
        }
        (self.processed_rows as f64 / self.total_rows as f64).min(1.0)
    }
}
