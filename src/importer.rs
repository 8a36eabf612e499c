use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::domain::CatalogRecord;
use crate::error::{IngestError, Result};
use crate::metrics;
use crate::options::ProcessingOptions;
use crate::pipeline::batch::{Batch, BatchResult};
use crate::pipeline::{CsvPipeline, PipelineEvent};
use crate::storage::CatalogStore;

/// What a finished import hands back to the caller
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Terminal batch, completed or failed
    pub batch: Batch,
    /// Accepted records; empty for a failed batch
    pub records: Vec<CatalogRecord>,
}

/// Use case for importing a CSV document into the catalog
///
/// Every run ends in a terminal [`Batch`]. Errors never escape `run`; they
/// become a failed batch that is still written to the history.
pub struct CatalogImporter {
    store: Arc<dyn CatalogStore>,
}

impl std::fmt::Debug for CatalogImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogImporter")
            .field("store", &"<Arc<dyn CatalogStore>>")
            .finish()
    }
}

impl CatalogImporter {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Read `path` and import it. An unreadable file yields a failed batch.
    pub async fn import_file(&self, path: &Path, options: ProcessingOptions) -> ImportOutcome {
        let source_filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match tokio::fs::read_to_string(path).await {
            Ok(text) => self.run(&source_filename, &text, options).await,
            Err(e) => {
                let batch = Batch::new(source_filename);
                self.finish_failed(batch, IngestError::Io(e), Vec::new(), Instant::now())
                    .await
            }
        }
    }

    pub async fn run(&self, source_filename: &str, text: &str, options: ProcessingOptions) -> ImportOutcome {
        let (progress, _) = watch::channel(Batch::new(source_filename));
        self.run_with_progress(source_filename, text, options, &progress)
            .await
    }

    /// Import `text`, publishing a snapshot of the batch on `progress` after
    /// every state change and after every row.
    #[instrument(skip(self, text, options, progress), fields(source = %source_filename))]
    pub async fn run_with_progress(
        &self,
        source_filename: &str,
        text: &str,
        options: ProcessingOptions,
        progress: &watch::Sender<Batch>,
    ) -> ImportOutcome {
        let outcome = self.execute(source_filename, text, options, progress).await;
        progress.send_replace(outcome.batch.clone());
        outcome
    }

    async fn execute(
        &self,
        source_filename: &str,
        text: &str,
        options: ProcessingOptions,
        progress: &watch::Sender<Batch>,
    ) -> ImportOutcome {
        let started = Instant::now();
        let batch = Batch::new(source_filename);
        progress.send_replace(batch.clone());
        info!("Starting import of {} (batch {})", source_filename, batch.id);

        let mut pipeline = match CsvPipeline::new(options) {
            Ok(pipeline) => pipeline,
            Err(e) => return self.finish_failed(batch, e, Vec::new(), started).await,
        };

        let mut run = match pipeline.begin(text) {
            Ok(run) => run,
            Err(e) => return self.finish_failed(batch, e, Vec::new(), started).await,
        };

        let mut batch = batch.start(run.total_rows());
        progress.send_replace(batch.clone());

        while let Some(event) = run.step() {
            if let PipelineEvent::RowProcessed { warning, .. } = event {
                match &warning {
                    Some(_) => metrics::import::row_skipped(),
                    None => metrics::import::row_converted(),
                }
                batch = batch.advance(warning);
                progress.send_replace(batch.clone());
            }
            tokio::task::yield_now().await;
        }

        let output = match run.finish() {
            Ok(output) => output,
            Err(e) => {
                let warnings = match &e {
                    IngestError::NoValidRecords { warnings } => warnings.clone(),
                    _ => Vec::new(),
                };
                return self.finish_failed(batch, e, warnings, started).await;
            }
        };

        metrics::import::records_validated(output.stats.count, output.outcome.rejected_count);

        if let Err(e) = self
            .store
            .save_records(batch.id, source_filename, output.accepted())
            .await
        {
            return self
                .finish_failed(batch, e, output.outcome.warning_messages(), started)
                .await;
        }

        let result = BatchResult::new(
            output.total_rows,
            output.converted_rows,
            output.outcome.rejected_count,
            output.stats.clone(),
        );
        for (tier, count) in &result.tier_counts {
            metrics::import::tier_counted(*tier, *count);
        }

        let batch = batch.complete(result, output.outcome.warning_messages());
        self.record_history(&batch).await;

        let elapsed = started.elapsed().as_secs_f64();
        metrics::import::run_finished("completed", elapsed);
        info!(
            "Import of {} completed: {} accepted, {} warnings in {:.2}s",
            source_filename,
            output.stats.count,
            batch.warnings.len(),
            elapsed
        );

        ImportOutcome {
            batch,
            records: output.outcome.accepted,
        }
    }

    /// Past runs, oldest first
    pub async fn history(&self) -> Result<Vec<Batch>> {
        self.store.history().await
    }

    async fn finish_failed(
        &self,
        batch: Batch,
        err: IngestError,
        warnings: Vec<String>,
        started: Instant,
    ) -> ImportOutcome {
        error!("Import of {} failed: {}", batch.source_filename, err);
        let batch = batch.fail(&err, warnings);
        self.record_history(&batch).await;
        metrics::import::run_finished("failed", started.elapsed().as_secs_f64());

        ImportOutcome {
            batch,
            records: Vec::new(),
        }
    }

    async fn record_history(&self, batch: &Batch) {
        if let Err(e) = self.store.append_history(batch).await {
            warn!("Failed to append batch {} to history: {}", batch.id, e);
        }
    }
}
