use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use catalog_ingest::config::Config;
use catalog_ingest::logging;
use catalog_ingest::storage::{CatalogStore, JsonFileStore};
use catalog_ingest::{BatchStatus, CatalogImporter, ClassificationRule, Tier};

#[derive(Parser)]
#[command(name = "catalog_ingest")]
#[command(about = "Import track catalogs from CSV into the virtual DJ store")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (defaults to $CATALOG_INGEST_CONFIG or catalog_ingest.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV file
    Import {
        file: PathBuf,
        /// Classification rule: weighted, divergence, inverse_popularity, fallback
        #[arg(long)]
        rule: Option<ClassificationRule>,
        /// Seed for placeholder values and tag selection
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        price_multiplier: Option<f64>,
        /// Reject records below this popularity (implies --enforce-quality)
        #[arg(long)]
        min_popularity: Option<f64>,
        #[arg(long)]
        enforce_quality: bool,
        /// Do not generate descriptive tags
        #[arg(long)]
        no_tags: bool,
        /// Perturb weighted scores by up to ±0.1
        #[arg(long)]
        quantum: bool,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List previous import runs
    History {
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Show the tier table
    Tiers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path)?;
    let _guard = logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Import {
            file,
            rule,
            seed,
            price_multiplier,
            min_popularity,
            enforce_quality,
            no_tags,
            quantum,
            output_dir,
        } => {
            let mut options = config.processing.clone();
            if let Some(rule) = rule {
                options.classification_rule = rule;
            }
            if seed.is_some() {
                options.seed = seed;
            }
            if let Some(multiplier) = price_multiplier {
                options.price_multiplier = multiplier;
            }
            if let Some(threshold) = min_popularity {
                options.min_popularity = threshold;
                options.enforce_quality = true;
            }
            options.enforce_quality |= enforce_quality;
            options.generate_tags &= !no_tags;
            options.quantum_randomness |= quantum;

            let output_dir = output_dir.unwrap_or_else(|| config.storage.output_dir.clone());
            let store: Arc<dyn CatalogStore> = Arc::new(JsonFileStore::new(&output_dir));
            let importer = CatalogImporter::new(store);

            info!("Importing {}", file.display());
            println!("🔄 Importing {}...", file.display());
            let outcome = importer.import_file(&file, options).await;
            let batch = &outcome.batch;

            match &batch.status {
                BatchStatus::Completed => {
                    if let Some(result) = &batch.result {
                        println!("\n📊 Import results for {}:", batch.source_filename);
                        println!("   Batch: {}", batch.id);
                        println!("   Rows: {}", result.total_rows);
                        println!("   Converted: {}", result.converted_rows);
                        println!("   Accepted: {}", result.accepted_rows);
                        println!("   Rejected: {}", result.rejected_rows);
                        println!("   Skipped: {}", result.skipped_rows);
                        for (tier, count) in &result.tier_counts {
                            println!("   {:<10} {}", tier.name(), count);
                        }
                        println!("   Total price: {:.2}", result.total_price);
                        println!("   Average price: {:.2}", result.average_price);
                        println!("   Tags: {}", result.total_tags);
                        println!("💾 Saved to {}", output_dir.join(format!("{}.json", batch.id)).display());
                    }
                    print_warnings(&batch.warnings);
                }
                BatchStatus::Failed { error: message } => {
                    error!("Import failed: {}", message);
                    println!("❌ Import failed: {}", message);
                    print_warnings(&batch.warnings);
                    anyhow::bail!("import of {} failed", batch.source_filename);
                }
                BatchStatus::Pending | BatchStatus::Processing => {
                    anyhow::bail!("import ended in non-terminal state {:?}", batch.status);
                }
            }
        }
        Commands::History { output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.storage.output_dir.clone());
            let store = JsonFileStore::new(&output_dir);
            let history = store.history().await?;
            if history.is_empty() {
                println!("No imports recorded in {}", output_dir.display());
            }
            for batch in history {
                let status = match &batch.status {
                    BatchStatus::Completed => "completed".to_string(),
                    BatchStatus::Failed { error } => format!("failed: {}", error),
                    other => format!("{:?}", other).to_lowercase(),
                };
                let accepted = batch.result.as_ref().map(|r| r.accepted_rows).unwrap_or(0);
                println!(
                    "{}  {}  {}  {}/{} rows, {} accepted  [{}]",
                    batch.started_at.format("%Y-%m-%d %H:%M:%S"),
                    batch.id,
                    batch.source_filename,
                    batch.processed_rows,
                    batch.total_rows,
                    accepted,
                    status
                );
            }
        }
        Commands::Tiers => {
            for tier in Tier::ALL {
                println!(
                    "{:<10} base {:>6.2}  {}  {}",
                    tier.name(),
                    tier.base_price(),
                    tier.color(),
                    tier.code_prefix()
                );
            }
        }
    }

    Ok(())
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n⚠️  {} warnings:", warnings.len());
    for warning in warnings {
        println!("   - {}", warning);
    }
}
