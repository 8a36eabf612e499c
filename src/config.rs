use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE, DEFAULT_LOG_FILTER,
    DEFAULT_OUTPUT_DIR,
};
use crate::error::{IngestError, Result};
use crate::options::ProcessingOptions;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub processing: ProcessingOptions,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
    /// Used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
            file_prefix: DEFAULT_LOG_FILE.to_string(),
            default_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Path from `CATALOG_INGEST_CONFIG`, else `catalog_ingest.toml`
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.processing.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ClassificationRule;
    use std::io::Write;

    #[test]
    fn test_full_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[processing]
classification_rule = "inverse_popularity"
enforce_quality = true
min_popularity = 45.0
price_multiplier = 1.5

[storage]
output_dir = "imports"

[logging]
directory = "var/log"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.processing.classification_rule,
            ClassificationRule::InversePopularity
        );
        assert!(config.processing.enforce_quality);
        assert_eq!(config.processing.min_popularity, 45.0);
        assert_eq!(config.storage.output_dir, PathBuf::from("imports"));
        assert_eq!(config.logging.directory, PathBuf::from("var/log"));
        assert_eq!(config.logging.file_prefix, DEFAULT_LOG_FILE);
    }

    #[test]
    fn test_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert!(matches!(
            Config::load(&dir.path().join("absent.toml")),
            Err(IngestError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_processing_values_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[processing]\nprice_multiplier = -3.0").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(IngestError::InvalidOptions(_))
        ));
    }
}
