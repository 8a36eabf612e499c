use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV file must contain at least a header row and one data row.")]
    EmptyInput,

    #[error("No valid records could be created from the CSV data.")]
    NoValidRecords { warnings: Vec<String> },

    #[error("Invalid processing options: {0}")]
    InvalidOptions(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure confined to a single data row. The pipeline turns these into
/// warnings and moves on to the next row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Row {row}: only {found} fields, expected at least {expected_min}")]
    TooFewFields {
        row: usize,
        found: usize,
        expected_min: usize,
    },

    #[error("Row {row}: field '{field}' has non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        field: String,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
