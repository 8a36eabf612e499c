use crate::constants::HISTORY_FILE;
use crate::domain::CatalogRecord;
use crate::error::{IngestError, Result};
use crate::pipeline::batch::Batch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Persistence collaborator for imported records and run history
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Durably store the accepted records of one batch
    async fn save_records(&self, batch_id: Uuid, source_filename: &str, records: &[CatalogRecord]) -> Result<()>;

    /// Append a terminal batch to the run history
    async fn append_history(&self, batch: &Batch) -> Result<()>;

    /// Every recorded batch, oldest first
    async fn history(&self) -> Result<Vec<Batch>>;
}

/// Records saved for one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBatch {
    pub batch_id: Uuid,
    pub source_filename: String,
    pub records: Vec<CatalogRecord>,
}

/// In-memory storage implementation for development/testing
#[derive(Default)]
pub struct InMemoryCatalogStore {
    batches: Arc<Mutex<HashMap<Uuid, StoredBatch>>>,
    history: Arc<Mutex<Vec<Batch>>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records_for(&self, batch_id: Uuid) -> Result<Option<StoredBatch>> {
        Ok(lock(&self.batches)?.get(&batch_id).cloned())
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(lock(&self.batches)?.values().map(|b| b.records.len()).sum())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| IngestError::Storage(format!("store lock poisoned: {}", e)))
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn save_records(&self, batch_id: Uuid, source_filename: &str, records: &[CatalogRecord]) -> Result<()> {
        let mut batches = lock(&self.batches)?;
        batches.insert(
            batch_id,
            StoredBatch {
                batch_id,
                source_filename: source_filename.to_string(),
                records: records.to_vec(),
            },
        );
        debug!("Stored {} records for batch {}", records.len(), batch_id);
        Ok(())
    }

    async fn append_history(&self, batch: &Batch) -> Result<()> {
        lock(&self.history)?.push(batch.clone());
        Ok(())
    }

    async fn history(&self) -> Result<Vec<Batch>> {
        Ok(lock(&self.history)?.clone())
    }
}

/// Writes each batch to `<dir>/<batch_id>.json` and the run history to
/// `<dir>/history.jsonl`, one batch per line
pub struct JsonFileStore {
    output_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn batch_path(&self, batch_id: Uuid) -> PathBuf {
        self.output_dir.join(format!("{}.json", batch_id))
    }

    fn history_path(&self) -> PathBuf {
        self.output_dir.join(HISTORY_FILE)
    }

    /// Read back the records of a saved batch
    pub async fn load_batch(&self, batch_id: Uuid) -> Result<StoredBatch> {
        let content = tokio::fs::read_to_string(self.batch_path(batch_id)).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn save_records(&self, batch_id: Uuid, source_filename: &str, records: &[CatalogRecord]) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let stored = StoredBatch {
            batch_id,
            source_filename: source_filename.to_string(),
            records: records.to_vec(),
        };
        let path = self.batch_path(batch_id);
        let json_content = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&path, json_content).await?;

        debug!("Saved {} records to {}", records.len(), path.display());
        Ok(())
    }

    async fn append_history(&self, batch: &Batch) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut line = serde_json::to_string(batch)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn history(&self) -> Result<Vec<Batch>> {
        let content = match tokio::fs::read_to_string(self.history_path()).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(IngestError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_history_keeps_order() {
        let store = InMemoryCatalogStore::new();
        let first = Batch::new("a.csv").start(1).fail("bad", Vec::new());
        let second = Batch::new("b.csv").start(1).fail("worse", Vec::new());
        store.append_history(&first).await.unwrap();
        store.append_history(&second).await.unwrap();

        let history = store.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].source_filename, "a.csv");
        assert_eq!(history[1].source_filename, "b.csv");
    }

    #[tokio::test]
    async fn test_in_memory_records_are_keyed_by_batch() {
        let store = InMemoryCatalogStore::new();
        let id = Uuid::new_v4();
        store.save_records(id, "a.csv", &[]).await.unwrap();
        let stored = store.records_for(id).unwrap().unwrap();
        assert_eq!(stored.source_filename, "a.csv");
        assert!(store.records_for(Uuid::new_v4()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_store_history_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested"));
        assert!(store.history().await.unwrap().is_empty());
    }
}
