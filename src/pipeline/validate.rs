use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::CatalogRecord;
use crate::error::{IngestError, Result};
use crate::options::ProcessingOptions;

/// Reason a record was turned away
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Popularity under the configured threshold
    LowPopularity,
    /// Display name empty or whitespace
    MissingName,
    /// No artist name
    MissingArtist,
}

/// One failed check for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// 1-based data row
    pub row: usize,
    pub reason: RejectionReason,
    pub message: String,
}

/// Records split into the accepted set plus every warning raised
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// Accepted records, in input order
    pub accepted: Vec<CatalogRecord>,
    pub warnings: Vec<ValidationWarning>,
    pub rejected_count: usize,
}

impl ValidationOutcome {
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }
}

/// Applies quality-threshold and required-field checks
pub struct Validator {
    enforce_quality: bool,
    min_popularity: f64,
}

impl Validator {
    pub fn new(options: &ProcessingOptions) -> Self {
        Self {
            enforce_quality: options.enforce_quality,
            min_popularity: options.min_popularity,
        }
    }

    /// All checks that `record` fails. Empty means accepted.
    pub fn check(&self, record: &CatalogRecord) -> Vec<ValidationWarning> {
        let row = record.metadata.source_row;
        let mut warnings = Vec::new();

        if self.enforce_quality && record.popularity < self.min_popularity {
            warnings.push(ValidationWarning {
                row,
                reason: RejectionReason::LowPopularity,
                message: format!(
                    "Row {}: \"{}\" has popularity {} below the threshold of {}",
                    row, record.name, record.popularity, self.min_popularity
                ),
            });
        }

        if record.name.trim().is_empty() {
            warnings.push(ValidationWarning {
                row,
                reason: RejectionReason::MissingName,
                message: format!("Row {}: track name is missing", row),
            });
        }

        if !record.artists.iter().any(|a| !a.trim().is_empty()) {
            warnings.push(ValidationWarning {
                row,
                reason: RejectionReason::MissingArtist,
                message: format!("Row {}: \"{}\" has no artist", row, record.name),
            });
        }

        warnings
    }

    /// Partition `records`. Fails with [`IngestError::NoValidRecords`] only
    /// when nothing is accepted.
    pub fn validate(&self, records: Vec<CatalogRecord>) -> Result<ValidationOutcome> {
        let mut accepted = Vec::with_capacity(records.len());
        let mut warnings = Vec::new();
        let mut rejected_count = 0;

        for record in records {
            let failures = self.check(&record);
            if failures.is_empty() {
                accepted.push(record);
            } else {
                for failure in &failures {
                    warn!("{}", failure.message);
                }
                rejected_count += 1;
                warnings.extend(failures);
            }
        }

        if accepted.is_empty() {
            return Err(IngestError::NoValidRecords {
                warnings: warnings.into_iter().map(|w| w.message).collect(),
            });
        }

        Ok(ValidationOutcome {
            accepted,
            warnings,
            rejected_count,
        })
    }
}
