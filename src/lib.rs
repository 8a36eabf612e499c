pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod importer;
pub mod logging;
pub mod metrics;
pub mod options;
pub mod pipeline;
pub mod storage;

pub use domain::{CatalogRecord, Tier};
pub use error::{IngestError, Result};
pub use importer::{CatalogImporter, ImportOutcome};
pub use options::{ClassificationRule, ProcessingOptions};
pub use pipeline::batch::{Batch, BatchResult, BatchStatus};
pub use pipeline::{process_csv, CsvPipeline, PipelineOutput};
pub use storage::{CatalogStore, InMemoryCatalogStore, JsonFileStore};
