use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::options::ClassificationRule;

/// Rarity classification, ordered from commonest to rarest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Tier {
    /// All tiers, commonest first
    pub const ALL: [Tier; 6] = [
        Tier::Common,
        Tier::Uncommon,
        Tier::Rare,
        Tier::Epic,
        Tier::Legendary,
        Tier::Mythic,
    ];

    pub fn commonest() -> Self {
        Tier::Common
    }

    pub fn rarest() -> Self {
        Tier::Mythic
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tier::Common => "common",
            Tier::Uncommon => "uncommon",
            Tier::Rare => "rare",
            Tier::Epic => "epic",
            Tier::Legendary => "legendary",
            Tier::Mythic => "mythic",
        }
    }

    pub fn base_price(&self) -> f64 {
        match self {
            Tier::Common => 15.0,
            Tier::Uncommon => 25.0,
            Tier::Rare => 45.0,
            Tier::Epic => 85.0,
            Tier::Legendary => 150.0,
            Tier::Mythic => 300.0,
        }
    }

    /// Display color used by the catalog views
    pub fn color(&self) -> &'static str {
        match self {
            Tier::Common => "#9ca3af",
            Tier::Uncommon => "#22c55e",
            Tier::Rare => "#3b82f6",
            Tier::Epic => "#a855f7",
            Tier::Legendary => "#f59e0b",
            Tier::Mythic => "#ef4444",
        }
    }

    /// Three-letter prefix of generated catalog codes
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Tier::Common => "COM",
            Tier::Uncommon => "UNC",
            Tier::Rare => "RAR",
            Tier::Epic => "EPC",
            Tier::Legendary => "LEG",
            Tier::Mythic => "MYT",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Audio feature scores, each in [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScores {
    pub energy: f64,
    pub danceability: f64,
    pub valence: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl FeatureScores {
    /// Clamp every score into [0,1]
    pub fn clamped(self) -> Self {
        Self {
            energy: self.energy.clamp(0.0, 1.0),
            danceability: self.danceability.clamp(0.0, 1.0),
            valence: self.valence.clamp(0.0, 1.0),
            acousticness: self.acousticness.clamp(0.0, 1.0),
            instrumentalness: self.instrumentalness.clamp(0.0, 1.0),
        }
    }
}

/// How a record's price was put together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base: f64,
    pub multiplier: f64,
    pub tag_bonus: f64,
    pub quality_bonus: f64,
    pub total: f64,
}

/// Derived and carried-through data attached to every catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub tier: Tier,
    pub tier_color: String,
    pub classification_rule: ClassificationRule,
    pub price_breakdown: PriceBreakdown,
    pub tags: Vec<String>,
    pub catalog_code: String,
    /// 1-based data row the record came from
    pub source_row: usize,
    pub imported_at: DateTime<Utc>,
    /// Columns that did not map onto a known field, keyed by canonical name
    pub extra: BTreeMap<String, String>,
}

/// One ingested track-like catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub collection: String,
    /// Popularity score in [0,100]
    pub popularity: f64,
    pub features: FeatureScores,
    pub tier: Tier,
    pub price: f64,
    pub tags: Vec<String>,
    pub metadata: RecordMetadata,
}

impl CatalogRecord {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_ordered_commonest_to_rarest() {
        let mut sorted = Tier::ALL;
        sorted.sort();
        assert_eq!(sorted, Tier::ALL);
        assert_eq!(Tier::commonest(), Tier::ALL[0]);
        assert_eq!(Tier::rarest(), Tier::ALL[5]);
    }

    #[test]
    fn test_base_price_rises_with_rarity() {
        for pair in Tier::ALL.windows(2) {
            assert!(pair[0].base_price() < pair[1].base_price());
        }
    }

    #[test]
    fn test_tier_serializes_as_snake_case_name() {
        let json = serde_json::to_string(&Tier::Legendary).unwrap();
        assert_eq!(json, "\"legendary\"");
    }

    #[test]
    fn test_feature_scores_are_clamped() {
        let scores = FeatureScores {
            energy: 1.7,
            danceability: -0.2,
            valence: 0.4,
            acousticness: 0.0,
            instrumentalness: 1.0,
        }
        .clamped();
        assert_eq!(scores.energy, 1.0);
        assert_eq!(scores.danceability, 0.0);
        assert_eq!(scores.valence, 0.4);
    }
}
