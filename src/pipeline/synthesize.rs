//! Turns normalized rows into catalog records.
//!
//! Missing optional values never fail a row. Absent identifiers and names get
//! placeholders, absent scores get random placeholder values drawn from the
//! synthesizer's own RNG so a seeded run is reproducible.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::debug;

use crate::constants::{
    ACOUSTICNESS_FIELD, ARTIST_ALIASES, ARTIST_SEPARATORS, COLLECTION_ALIASES,
    DANCEABILITY_FIELD, ENERGY_FIELD, ID_ALIASES, INSTRUMENTALNESS_FIELD, MAX_TAGS_PER_RECORD,
    NAME_ALIASES, POPULARITY_FIELD, POPULARITY_MAX, QUALITY_BONUS_PIVOT, QUALITY_BONUS_STEP,
    TAG_VOCABULARY, VALENCE_FIELD,
};
use crate::domain::{CatalogRecord, FeatureScores, PriceBreakdown, RecordMetadata, Tier};
use crate::error::RowError;
use crate::options::ProcessingOptions;
use crate::pipeline::classify::{classify, ClassificationInput};
use crate::pipeline::normalize::NormalizedRow;

const FEATURE_FIELDS: [&str; 5] = [
    ENERGY_FIELD,
    DANCEABILITY_FIELD,
    VALENCE_FIELD,
    ACOUSTICNESS_FIELD,
    INSTRUMENTALNESS_FIELD,
];

/// Builds one [`CatalogRecord`] per normalized row. Call
/// [`RecordSynthesizer::begin_run`] before each document.
pub struct RecordSynthesizer {
    options: ProcessingOptions,
    rng: StdRng,
    started_at: DateTime<Utc>,
}

impl RecordSynthesizer {
    pub fn new(options: ProcessingOptions) -> Self {
        Self {
            rng: fresh_rng(options.seed),
            options,
            started_at: Utc::now(),
        }
    }

    /// Start a new document: reseed the RNG and take a run timestamp that is
    /// strictly later than the previous run's, so synthesized ids never repeat.
    pub fn begin_run(&mut self) {
        self.rng = fresh_rng(self.options.seed);
        let floor = self.started_at + Duration::milliseconds(1);
        self.started_at = Utc::now().max(floor);
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Build the record for the 1-based data row `row`
    pub fn synthesize(&mut self, row: &NormalizedRow, row_number: usize) -> Result<CatalogRecord, RowError> {
        let id = row
            .first_non_empty(ID_ALIASES)
            .map(str::to_string)
            .unwrap_or_else(|| self.synthetic_id(row_number));

        let name = row
            .first_column(NAME_ALIASES)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Untitled Track {}", row_number));

        let artists = match row.first_column(ARTIST_ALIASES) {
            Some(cell) => split_artists(cell),
            None => vec![format!("Unknown Artist {}", row_number)],
        };

        let collection = row
            .first_column(COLLECTION_ALIASES)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown Collection {}", row_number));

        let popularity = match parse_score(row, POPULARITY_FIELD, row_number)? {
            Some(value) => value,
            None => self.rng.gen_range(0.0..=POPULARITY_MAX),
        }
        .clamp(0.0, POPULARITY_MAX);

        let mut scores = [0.0; FEATURE_FIELDS.len()];
        for (slot, field) in scores.iter_mut().zip(FEATURE_FIELDS) {
            *slot = match parse_score(row, field, row_number)? {
                Some(value) => value,
                None => self.rng.gen::<f64>(),
            };
        }
        let features = FeatureScores {
            energy: scores[0],
            danceability: scores[1],
            valence: scores[2],
            acousticness: scores[3],
            instrumentalness: scores[4],
        }
        .clamped();

        let tier = classify(
            self.options.classification_rule,
            &ClassificationInput { popularity, features },
            self.options.quantum_randomness,
            &mut self.rng,
        );

        let tags = self.pick_tags();
        let price_breakdown = compute_price(tier, tags.len(), popularity, &self.options);
        let catalog_code = format!(
            "{}-{:04}-{:04X}",
            tier.code_prefix(),
            row_number,
            self.rng.gen::<u16>()
        );

        debug!(
            "Synthesized row {}: '{}' as {} at {:.2}",
            row_number, name, tier, price_breakdown.total
        );

        Ok(CatalogRecord {
            id,
            name,
            artists,
            collection,
            popularity,
            features,
            tier,
            price: price_breakdown.total,
            tags: tags.clone(),
            metadata: RecordMetadata {
                tier,
                tier_color: tier.color().to_string(),
                classification_rule: self.options.classification_rule,
                price_breakdown,
                tags,
                catalog_code,
                source_row: row_number,
                imported_at: Utc::now(),
                extra: extra_columns(row),
            },
        })
    }

    fn synthetic_id(&self, row_number: usize) -> String {
        format!("track_{}_{}", self.started_at.timestamp_millis(), row_number)
    }

    /// One to three distinct tags, or none when tagging is off
    fn pick_tags(&mut self) -> Vec<String> {
        if !self.options.generate_tags {
            return Vec::new();
        }
        let count = self.rng.gen_range(1..=MAX_TAGS_PER_RECORD);
        TAG_VOCABULARY
            .choose_multiple(&mut self.rng, count)
            .map(|tag| tag.to_string())
            .collect()
    }
}

/// `base × multiplier + tags × tag_bonus + max(0, (popularity − 50) / 10) × quality_bonus`,
/// rounded to cents
pub fn compute_price(
    tier: Tier,
    tag_count: usize,
    popularity: f64,
    options: &ProcessingOptions,
) -> PriceBreakdown {
    let base = tier.base_price();
    let tag_bonus = tag_count as f64 * options.tag_bonus;
    let quality_steps = ((popularity - QUALITY_BONUS_PIVOT) / QUALITY_BONUS_STEP).max(0.0);
    let quality_bonus = quality_steps * options.quality_bonus;
    let total = round_cents(base * options.price_multiplier + tag_bonus + quality_bonus).max(0.0);

    PriceBreakdown {
        base,
        multiplier: options.price_multiplier,
        tag_bonus: round_cents(tag_bonus),
        quality_bonus: round_cents(quality_bonus),
        total,
    }
}

fn fresh_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a numeric column. Absent or empty cells are `None`.
fn parse_score(row: &NormalizedRow, field: &str, row_number: usize) -> Result<Option<f64>, RowError> {
    let raw = match row.get(field) {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(None),
    };
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(RowError::InvalidNumber {
            row: row_number,
            field: field.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn split_artists(cell: &str) -> Vec<String> {
    cell.split(ARTIST_SEPARATORS)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_known_column(key: &str) -> bool {
    ID_ALIASES.contains(&key)
        || NAME_ALIASES.contains(&key)
        || ARTIST_ALIASES.contains(&key)
        || COLLECTION_ALIASES.contains(&key)
        || FEATURE_FIELDS.contains(&key)
        || key == POPULARITY_FIELD
}

fn extra_columns(row: &NormalizedRow) -> BTreeMap<String, String> {
    row.iter()
        .filter(|(key, _)| !is_known_column(key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
