// CSV ingestion pipeline: tokenize, normalize, synthesize, validate, aggregate

pub mod aggregate;
pub mod batch;
pub mod classify;
pub mod normalize;
pub mod synthesize;
pub mod tokenizer;
pub mod validate;

use tracing::{debug, info, warn};

use crate::domain::CatalogRecord;
use crate::error::Result;
use crate::options::ProcessingOptions;
use aggregate::{aggregate, BatchStats};
use normalize::{check_field_count, normalize_row};
use synthesize::RecordSynthesizer;
use tokenizer::{parse_document, ParsedDocument};
use validate::{ValidationOutcome, Validator};

/// Progress notifications emitted while a document is processed
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Header parsed, data rows counted
    Started { total_rows: usize },
    /// One data row handled; `warning` is set when the row was skipped
    RowProcessed { row: usize, warning: Option<String> },
}

/// Everything one pass over a document produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub total_rows: usize,
    pub converted_rows: usize,
    /// Warnings for rows that never became a record
    pub row_warnings: Vec<String>,
    pub outcome: ValidationOutcome,
    pub stats: BatchStats,
}

impl PipelineOutput {
    pub fn accepted(&self) -> &[CatalogRecord] {
        &self.outcome.accepted
    }

    /// Row warnings followed by validation warnings
    pub fn all_warnings(&self) -> Vec<String> {
        let mut warnings = self.row_warnings.clone();
        warnings.extend(self.outcome.warning_messages());
        warnings
    }
}

/// Runs one document through every stage, strictly row by row
pub struct CsvPipeline {
    synthesizer: RecordSynthesizer,
    validator: Validator,
}

impl CsvPipeline {
    /// Fails with `InvalidOptions` when the options cannot produce valid prices
    pub fn new(options: ProcessingOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            validator: Validator::new(&options),
            synthesizer: RecordSynthesizer::new(options),
        })
    }

    pub fn options(&self) -> &ProcessingOptions {
        self.synthesizer.options()
    }

    /// Parse `text` and return a run that processes one row per [`PipelineRun::step`].
    /// Fails with `EmptyInput` when there is no data row.
    pub fn begin(&mut self, text: &str) -> Result<PipelineRun<'_>> {
        let document = parse_document(text)?;
        self.synthesizer.begin_run();
        info!(
            "Parsed {} columns and {} data rows",
            document.headers.len(),
            document.rows.len()
        );
        Ok(PipelineRun {
            records: Vec::with_capacity(document.rows.len()),
            row_warnings: Vec::new(),
            next_row: 0,
            document,
            pipeline: self,
        })
    }

    pub fn run(&mut self, text: &str) -> Result<PipelineOutput> {
        self.run_with_progress(text, |_| {})
    }

    /// Process `text`, calling `on_event` once at the start and once per row.
    ///
    /// Row-level problems are recorded as warnings and never abort the run.
    /// Empty input and a fully rejected document are errors.
    pub fn run_with_progress<F>(&mut self, text: &str, mut on_event: F) -> Result<PipelineOutput>
    where
        F: FnMut(PipelineEvent),
    {
        let mut run = self.begin(text)?;
        on_event(PipelineEvent::Started {
            total_rows: run.total_rows(),
        });
        while let Some(event) = run.step() {
            on_event(event);
        }
        run.finish()
    }
}

/// A document in the middle of being processed
pub struct PipelineRun<'p> {
    pipeline: &'p mut CsvPipeline,
    document: ParsedDocument,
    next_row: usize,
    records: Vec<CatalogRecord>,
    row_warnings: Vec<String>,
}

impl PipelineRun<'_> {
    pub fn total_rows(&self) -> usize {
        self.document.rows.len()
    }

    /// Process the next data row. `None` once every row has been handled.
    pub fn step(&mut self) -> Option<PipelineEvent> {
        let fields = self.document.rows.get(self.next_row)?;
        self.next_row += 1;
        let row = self.next_row;

        let headers = &self.document.headers;
        let synthesizer = &mut self.pipeline.synthesizer;
        let converted = check_field_count(row, headers, fields).and_then(|_| {
            let normalized = normalize_row(headers, fields);
            synthesizer.synthesize(&normalized, row)
        });

        let warning = match converted {
            Ok(record) => {
                self.records.push(record);
                None
            }
            Err(e) => {
                warn!("Skipping row: {}", e);
                self.row_warnings.push(e.to_string());
                Some(e.to_string())
            }
        };

        debug!("Processed {}/{} rows", row, self.total_rows());
        Some(PipelineEvent::RowProcessed { row, warning })
    }

    /// Validate and aggregate whatever has been converted. Rows not yet
    /// stepped through are processed first.
    pub fn finish(mut self) -> Result<PipelineOutput> {
        while self.step().is_some() {}

        let total_rows = self.total_rows();
        let converted_rows = self.records.len();
        let outcome = self.pipeline.validator.validate(self.records)?;
        let stats = aggregate(&outcome.accepted);

        info!(
            "Accepted {} of {} rows ({} rejected, {} skipped)",
            stats.count,
            total_rows,
            outcome.rejected_count,
            total_rows - converted_rows
        );

        Ok(PipelineOutput {
            total_rows,
            converted_rows,
            row_warnings: self.row_warnings,
            outcome,
            stats,
        })
    }
}

/// One-shot convenience over [`CsvPipeline`]
pub fn process_csv(text: &str, options: ProcessingOptions) -> Result<PipelineOutput> {
    CsvPipeline::new(options)?.run(text)
}
