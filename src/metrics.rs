//! Metrics for the ingestion pipeline
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! hosting process installs a recorder.

use std::fmt;

use crate::domain::Tier;

/// All metric names used by the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RunsTotal,
    RunDuration,
    RowsTotal,
    RecordsAccepted,
    RecordsRejected,
    RecordsByTier,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RunsTotal => "catalog_ingest_runs_total",
            MetricName::RunDuration => "catalog_ingest_run_duration_seconds",
            MetricName::RowsTotal => "catalog_ingest_rows_total",
            MetricName::RecordsAccepted => "catalog_ingest_records_accepted_total",
            MetricName::RecordsRejected => "catalog_ingest_records_rejected_total",
            MetricName::RecordsByTier => "catalog_ingest_records_by_tier_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod import {
    use super::{MetricName, Tier};

    /// Record a finished run; `status` is `completed` or `failed`
    pub fn run_finished(status: &'static str, duration_secs: f64) {
        ::metrics::counter!(MetricName::RunsTotal.as_str(), "status" => status).increment(1);
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(duration_secs);
    }

    pub fn row_converted() {
        ::metrics::counter!(MetricName::RowsTotal.as_str(), "outcome" => "converted").increment(1);
    }

    pub fn row_skipped() {
        ::metrics::counter!(MetricName::RowsTotal.as_str(), "outcome" => "skipped").increment(1);
    }

    pub fn records_validated(accepted: usize, rejected: usize) {
        ::metrics::counter!(MetricName::RecordsAccepted.as_str()).increment(accepted as u64);
        ::metrics::counter!(MetricName::RecordsRejected.as_str()).increment(rejected as u64);
    }

    pub fn tier_counted(tier: Tier, count: usize) {
        ::metrics::counter!(MetricName::RecordsByTier.as_str(), "tier" => tier.name())
            .increment(count as u64);
    }
}
