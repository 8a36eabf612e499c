use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_MIN_POPULARITY, DEFAULT_PRICE_MULTIPLIER, DEFAULT_QUALITY_BONUS, DEFAULT_TAG_BONUS,
    POPULARITY_MAX,
};
use crate::error::{IngestError, Result};

/// Which algorithm assigns a tier to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationRule {
    /// Weighted blend of popularity and feature scores
    #[default]
    Weighted,
    /// Distance of the feature scores from the midpoint
    Divergence,
    /// Lower popularity yields a rarer tier
    InversePopularity,
    /// Everything is the commonest tier
    Fallback,
}

impl ClassificationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationRule::Weighted => "weighted",
            ClassificationRule::Divergence => "divergence",
            ClassificationRule::InversePopularity => "inverse_popularity",
            ClassificationRule::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassificationRule {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "weighted" => Ok(ClassificationRule::Weighted),
            "divergence" => Ok(ClassificationRule::Divergence),
            "inverse_popularity" => Ok(ClassificationRule::InversePopularity),
            "fallback" => Ok(ClassificationRule::Fallback),
            other => Err(IngestError::InvalidOptions(format!(
                "unknown classification rule '{}'",
                other
            ))),
        }
    }
}

/// Settings for one ingestion run. Supplied before the run and never
/// changed while it is in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Attach descriptive tags to records
    pub generate_tags: bool,
    /// Applied to the tier base price
    pub price_multiplier: f64,
    /// Added to the price once per tag
    pub tag_bonus: f64,
    /// Added per 10 popularity points above 50
    pub quality_bonus: f64,
    /// Reject records whose popularity is under `min_popularity`
    pub enforce_quality: bool,
    pub min_popularity: f64,
    pub classification_rule: ClassificationRule,
    /// Perturb the weighted score by up to ±0.1
    pub quantum_randomness: bool,
    /// Fixes every random draw of the run when set
    pub seed: Option<u64>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            generate_tags: true,
            price_multiplier: DEFAULT_PRICE_MULTIPLIER,
            tag_bonus: DEFAULT_TAG_BONUS,
            quality_bonus: DEFAULT_QUALITY_BONUS,
            enforce_quality: false,
            min_popularity: DEFAULT_MIN_POPULARITY,
            classification_rule: ClassificationRule::default(),
            quantum_randomness: false,
            seed: None,
        }
    }
}

impl ProcessingOptions {
    /// Check the numeric settings so that every derived price stays non-negative
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("price_multiplier", self.price_multiplier),
            ("tag_bonus", self.tag_bonus),
            ("quality_bonus", self.quality_bonus),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(IngestError::InvalidOptions(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !self.min_popularity.is_finite()
            || self.min_popularity < 0.0
            || self.min_popularity > POPULARITY_MAX
        {
            return Err(IngestError::InvalidOptions(format!(
                "min_popularity must be within 0..=100, got {}",
                self.min_popularity
            )));
        }

        Ok(())
    }
}
