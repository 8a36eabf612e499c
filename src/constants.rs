//! Header aliases and fixed vocabularies shared across the pipeline stages.
//! Aliases are listed in priority order; the first one present in the header wins.

// Identifier columns
pub const ID_ALIASES: &[&str] = &["id", "track_id", "spotify_id", "isrc"];

// Display name columns
pub const NAME_ALIASES: &[&str] = &["track_name", "track", "title", "song", "name"];

// Artist columns
pub const ARTIST_ALIASES: &[&str] = &["artist_name", "artist", "artists", "performer"];

// Collection (album / playlist) columns
pub const COLLECTION_ALIASES: &[&str] = &["album_name", "album", "collection", "playlist"];

pub const POPULARITY_FIELD: &str = "popularity";
pub const ENERGY_FIELD: &str = "energy";
pub const DANCEABILITY_FIELD: &str = "danceability";
pub const VALENCE_FIELD: &str = "valence";
pub const ACOUSTICNESS_FIELD: &str = "acousticness";
pub const INSTRUMENTALNESS_FIELD: &str = "instrumentalness";

/// Separators accepted between several artists in one cell
pub const ARTIST_SEPARATORS: &[char] = &[';', '|'];

/// Descriptive tag vocabulary
pub const TAG_VOCABULARY: [&str; 12] = [
    "Chill",
    "Energetic",
    "Groovy",
    "Dark",
    "Uplifting",
    "Melodic",
    "Underground",
    "Classic",
    "Experimental",
    "Vocal",
    "Peak Time",
    "Warm Up",
];

pub const MAX_TAGS_PER_RECORD: usize = 3;

// Weighted-score rule weights (popularity is scaled to [0,1] first)
pub const WEIGHT_POPULARITY: f64 = 0.30;
pub const WEIGHT_ENERGY: f64 = 0.20;
pub const WEIGHT_DANCEABILITY: f64 = 0.20;
pub const WEIGHT_VALENCE: f64 = 0.15;
pub const WEIGHT_ACOUSTICNESS: f64 = 0.15;

/// Half-width of the symmetric perturbation applied by quantum randomness
pub const QUANTUM_OFFSET: f64 = 0.1;

pub const POPULARITY_MAX: f64 = 100.0;

/// Popularity above which the quality bonus starts accruing
pub const QUALITY_BONUS_PIVOT: f64 = 50.0;
pub const QUALITY_BONUS_STEP: f64 = 10.0;

pub const DEFAULT_PRICE_MULTIPLIER: f64 = 1.0;
pub const DEFAULT_TAG_BONUS: f64 = 2.5;
pub const DEFAULT_QUALITY_BONUS: f64 = 5.0;
pub const DEFAULT_MIN_POPULARITY: f64 = 30.0;

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "catalog_ingest.log";
pub const DEFAULT_LOG_FILTER: &str = "catalog_ingest=info";
pub const DEFAULT_CONFIG_PATH: &str = "catalog_ingest.toml";
pub const CONFIG_PATH_ENV: &str = "CATALOG_INGEST_CONFIG";

pub const HISTORY_FILE: &str = "history.jsonl";
