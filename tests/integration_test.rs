use anyhow::Result;
use async_trait::async_trait;
use catalog_ingest::storage::{CatalogStore, InMemoryCatalogStore, JsonFileStore};
use catalog_ingest::{
    Batch, BatchStatus, CatalogImporter, CatalogRecord, ClassificationRule, IngestError,
    ProcessingOptions, Tier,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use tempfile::tempdir;
use tokio::sync::watch;

fn seeded() -> ProcessingOptions {
    ProcessingOptions {
        seed: Some(2024),
        ..Default::default()
    }
}

fn in_memory() -> (Arc<InMemoryCatalogStore>, CatalogImporter) {
    let store = Arc::new(InMemoryCatalogStore::new());
    let importer = CatalogImporter::new(store.clone());
    (store, importer)
}

/// Keeps history but refuses to store records
#[derive(Default)]
struct FullDiskStore {
    history: Mutex<Vec<Batch>>,
}

#[async_trait]
impl CatalogStore for FullDiskStore {
    async fn save_records(
        &self,
        _batch_id: Uuid,
        _source_filename: &str,
        _records: &[CatalogRecord],
    ) -> catalog_ingest::Result<()> {
        Err(IngestError::Storage("disk full".to_string()))
    }

    async fn append_history(&self, batch: &Batch) -> catalog_ingest::Result<()> {
        self.history.lock().unwrap().push(batch.clone());
        Ok(())
    }

    async fn history(&self) -> catalog_ingest::Result<Vec<Batch>> {
        Ok(self.history.lock().unwrap().clone())
    }
}

fn failure_message(batch: &Batch) -> &str {
    match &batch.status {
        BatchStatus::Failed { error } => error,
        other => panic!("expected failed batch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_minimal_document_yields_one_record() -> Result<()> {
    let (store, importer) = in_memory();

    let outcome = importer.run("tracks.csv", "name,artist\nFoo,Bar\n", seeded()).await;

    assert_eq!(outcome.batch.status, BatchStatus::Completed);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].name, "Foo");
    assert_eq!(outcome.records[0].primary_artist(), Some("Bar"));

    let result = outcome.batch.result.clone().expect("completed batch has a result");
    assert_eq!(result.total_rows, 1);
    assert_eq!(result.accepted_rows, 1);
    assert_eq!(result.tier_counts.values().sum::<usize>(), 1);

    let stored = store.records_for(outcome.batch.id)?.expect("records saved");
    assert_eq!(stored.source_filename, "tracks.csv");
    assert_eq!(stored.records, outcome.records);
    Ok(())
}

#[tokio::test]
async fn test_quoted_comma_survives_import() -> Result<()> {
    let (_, importer) = in_memory();

    let outcome = importer
        .run("quoted.csv", "name,artist\n\"Song, Pt. 2\",Artist\n", seeded())
        .await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].name, "Song, Pt. 2");
    assert_eq!(outcome.records[0].artists, vec!["Artist"]);
    Ok(())
}

#[tokio::test]
async fn test_header_only_document_fails_and_is_kept_in_history() -> Result<()> {
    let (store, importer) = in_memory();

    let outcome = importer.run("empty.csv", "name,artist\n", seeded()).await;

    assert!(outcome.batch.is_failed());
    assert_eq!(
        failure_message(&outcome.batch),
        "CSV file must contain at least a header row and one data row."
    );
    assert!(outcome.batch.finished_at.is_some());
    assert!(outcome.records.is_empty());

    let history = store.history().await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, outcome.batch.id);
    assert_eq!(store.record_count()?, 0);
    Ok(())
}

#[tokio::test]
async fn test_every_row_invalid_fails_with_warnings() -> Result<()> {
    let (_, importer) = in_memory();

    let outcome = importer
        .run("nameless.csv", "name,artist\n,A\n  ,B\n", seeded())
        .await;

    assert_eq!(
        failure_message(&outcome.batch),
        "No valid records could be created from the CSV data."
    );
    assert_eq!(outcome.batch.processed_rows, 2);
    assert_eq!(outcome.batch.warnings.len(), 2);
    assert!(outcome.batch.warnings[0].starts_with("Row 1"));
    Ok(())
}

#[tokio::test]
async fn test_low_popularity_row_rejected_when_enforced() -> Result<()> {
    let (_, importer) = in_memory();
    let options = ProcessingOptions {
        enforce_quality: true,
        min_popularity: 30.0,
        ..seeded()
    };

    let outcome = importer
        .run(
            "quality.csv",
            "name,artist,popularity\nHit,A,80\nObscure,B,5\n",
            options,
        )
        .await;

    assert_eq!(outcome.batch.status, BatchStatus::Completed);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.batch.warnings.len(), 1);
    let warning = &outcome.batch.warnings[0];
    assert!(warning.contains("Row 2"), "{}", warning);
    assert!(warning.contains("popularity 5"), "{}", warning);

    let result = outcome.batch.result.expect("result");
    assert_eq!(result.rejected_rows, 1);
    assert_eq!(result.accepted_rows, 1);
    Ok(())
}

#[tokio::test]
async fn test_low_popularity_kept_when_not_enforced() -> Result<()> {
    let (_, importer) = in_memory();

    let outcome = importer
        .run("quality.csv", "name,artist,popularity\nObscure,B,5\n", seeded())
        .await;

    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.batch.warnings.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_inverse_popularity_rule() -> Result<()> {
    let (_, importer) = in_memory();
    let options = ProcessingOptions {
        classification_rule: ClassificationRule::InversePopularity,
        ..seeded()
    };

    let outcome = importer
        .run(
            "inverse.csv",
            "title,artist,popularity\nMainstream,A,95\nDeep Cut,B,5\n",
            options,
        )
        .await;

    assert_eq!(outcome.records[0].tier, Tier::commonest());
    assert_eq!(outcome.records[1].tier, Tier::rarest());
    Ok(())
}

#[tokio::test]
async fn test_unparseable_rows_become_warnings() -> Result<()> {
    let (_, importer) = in_memory();
    let text = "name,artist,album,energy\nGood,A,X,0.5\nBad\nLoud,B,Y,very\nAlso Good,C,Z,0.1\n";

    let outcome = importer.run("mixed.csv", text, seeded()).await;

    assert_eq!(outcome.batch.status, BatchStatus::Completed);
    assert_eq!(outcome.records.len(), 2);
    let result = outcome.batch.result.clone().expect("result");
    assert_eq!(result.total_rows, 4);
    assert_eq!(result.converted_rows, 2);
    assert_eq!(result.skipped_rows, 2);
    assert_eq!(outcome.batch.warnings.len(), 2);
    assert!(outcome.batch.warnings[1].contains("energy"));
    Ok(())
}

#[tokio::test]
async fn test_invalid_options_fail_the_batch() -> Result<()> {
    let (_, importer) = in_memory();
    let options = ProcessingOptions {
        price_multiplier: -1.0,
        ..seeded()
    };

    let outcome = importer.run("tracks.csv", "name,artist\nFoo,Bar\n", options).await;

    assert!(failure_message(&outcome.batch).contains("price_multiplier"));
    Ok(())
}

#[tokio::test]
async fn test_progress_channel_ends_on_terminal_snapshot() -> Result<()> {
    let (_, importer) = in_memory();
    let (tx, rx) = watch::channel(Batch::new("progress.csv"));

    let outcome = importer
        .run_with_progress("progress.csv", "name,artist\nA,B\nC,D\nE,F\n", seeded(), &tx)
        .await;

    let last = rx.borrow().clone();
    assert!(last.is_terminal());
    assert_eq!(last.id, outcome.batch.id);
    assert_eq!(last.processed_rows, 3);
    assert_eq!(last.total_rows, 3);
    assert_eq!(last.progress(), 1.0);
    Ok(())
}

#[tokio::test]
async fn test_same_seed_gives_same_catalog() -> Result<()> {
    let (_, importer) = in_memory();
    let text = "name,artist\nA,B\nC,D\nE,F\nG,H\n";

    let first = importer.run("a.csv", text, seeded()).await;
    let second = importer.run("b.csv", text, seeded()).await;

    let summary = |records: &[CatalogRecord]| -> Vec<(Tier, f64, Vec<String>)> {
        records
            .iter()
            .map(|r| (r.tier, r.price, r.tags.clone()))
            .collect()
    };
    assert_eq!(summary(&first.records), summary(&second.records));
    Ok(())
}

#[tokio::test]
async fn test_json_store_persists_records_and_history() -> Result<()> {
    let temp_dir = tempdir()?;
    let store = Arc::new(JsonFileStore::new(temp_dir.path()));
    let importer = CatalogImporter::new(store.clone());

    let csv_path = temp_dir.path().join("crate.csv");
    std::fs::write(
        &csv_path,
        "Track Name,Artist Name,Album,Popularity,Energy,Label\r\nNight Drive,Kavi,Midnight,64,0.8,Nocturne\r\n",
    )?;

    let ok = importer.import_file(&csv_path, seeded()).await;
    assert_eq!(ok.batch.status, BatchStatus::Completed);
    assert_eq!(ok.batch.source_filename, "crate.csv");

    let stored = store.load_batch(ok.batch.id).await?;
    assert_eq!(stored.records.len(), 1);
    let record = &stored.records[0];
    assert_eq!(record.name, "Night Drive");
    assert_eq!(record.collection, "Midnight");
    assert_eq!(record.popularity, 64.0);
    assert_eq!(
        record.metadata.extra.get("label").map(String::as_str),
        Some("Nocturne")
    );

    let missing = importer
        .import_file(&temp_dir.path().join("missing.csv"), seeded())
        .await;
    assert!(missing.batch.is_failed());

    let history = store.history().await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].status, BatchStatus::Completed);
    assert!(history[1].is_failed());
    assert_eq!(history[0].id, ok.batch.id);
    assert_eq!(
        history[0].result.as_ref().map(|r| r.accepted_rows),
        Some(1)
    );
    Ok(())
}

#[tokio::test]
async fn test_persistence_error_fails_the_batch() -> Result<()> {
    let store = Arc::new(FullDiskStore::default());
    let importer = CatalogImporter::new(store.clone());

    let outcome = importer.run("tracks.csv", "name,artist\nFoo,Bar\n", seeded()).await;

    assert_eq!(failure_message(&outcome.batch), "Storage error: disk full");
    assert!(outcome.records.is_empty());
    assert!(outcome.batch.result.is_none());

    let history = store.history().await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, outcome.batch.id);
    assert!(history[0].is_failed());
    Ok(())
}

#[tokio::test]
async fn test_byte_order_mark_does_not_hide_first_column() -> Result<()> {
    let temp_dir = tempdir()?;
    let csv_path = temp_dir.path().join("export.csv");
    std::fs::write(&csv_path, "\u{feff}name,artist\r\nFoo,Bar\r\n")?;
    let (_, importer) = in_memory();

    let outcome = importer.import_file(&csv_path, seeded()).await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].name, "Foo");
    assert!(outcome.records[0].metadata.extra.is_empty());
    Ok(())
}
