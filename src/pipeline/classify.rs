//! Tier classification rules.
//!
//! Every rule returns a member of [`Tier::ALL`]; the divergence rule never
//! reaches [`Tier::Mythic`].

use rand::Rng;

use crate::constants::{
    POPULARITY_MAX, QUANTUM_OFFSET, WEIGHT_ACOUSTICNESS, WEIGHT_DANCEABILITY, WEIGHT_ENERGY,
    WEIGHT_POPULARITY, WEIGHT_VALENCE,
};
use crate::domain::{FeatureScores, Tier};
use crate::options::ClassificationRule;

/// Inputs every rule draws from
#[derive(Debug, Clone, Copy)]
pub struct ClassificationInput {
    /// Popularity in [0,100]
    pub popularity: f64,
    pub features: FeatureScores,
}

/// Classify with the selected rule. `rng` is only consulted by the weighted
/// rule when `quantum_randomness` is on.
pub fn classify<R: Rng + ?Sized>(
    rule: ClassificationRule,
    input: &ClassificationInput,
    quantum_randomness: bool,
    rng: &mut R,
) -> Tier {
    match rule {
        ClassificationRule::Weighted => {
            let offset = if quantum_randomness {
                rng.gen_range(-QUANTUM_OFFSET..=QUANTUM_OFFSET)
            } else {
                0.0
            };
            weighted_tier(weighted_score(input) + offset)
        }
        ClassificationRule::Divergence => divergence_tier(divergence(&input.features)),
        ClassificationRule::InversePopularity => inverse_popularity_tier(input.popularity),
        ClassificationRule::Fallback => Tier::commonest(),
    }
}

/// Linear blend of popularity and features; the weights sum to 1.0
pub fn weighted_score(input: &ClassificationInput) -> f64 {
    let f = &input.features;
    WEIGHT_POPULARITY * (input.popularity / POPULARITY_MAX)
        + WEIGHT_ENERGY * f.energy
        + WEIGHT_DANCEABILITY * f.danceability
        + WEIGHT_VALENCE * f.valence
        + WEIGHT_ACOUSTICNESS * f.acousticness
}

pub fn weighted_tier(score: f64) -> Tier {
    let score = score.clamp(0.0, 1.0);
    if score > 0.95 {
        Tier::Mythic
    } else if score > 0.85 {
        Tier::Legendary
    } else if score > 0.70 {
        Tier::Epic
    } else if score > 0.50 {
        Tier::Rare
    } else if score > 0.30 {
        Tier::Uncommon
    } else {
        Tier::Common
    }
}

/// Summed distance of energy, danceability and valence from 0.5, in [0,1.5]
pub fn divergence(features: &FeatureScores) -> f64 {
    (features.energy - 0.5).abs()
        + (features.danceability - 0.5).abs()
        + (features.valence - 0.5).abs()
}

pub fn divergence_tier(divergence: f64) -> Tier {
    if divergence > 1.2 {
        Tier::Legendary
    } else if divergence > 0.9 {
        Tier::Epic
    } else if divergence > 0.6 {
        Tier::Rare
    } else if divergence > 0.3 {
        Tier::Uncommon
    } else {
        Tier::Common
    }
}

pub fn inverse_popularity_tier(popularity: f64) -> Tier {
    if popularity < 10.0 {
        Tier::Mythic
    } else if popularity < 25.0 {
        Tier::Legendary
    } else if popularity < 40.0 {
        Tier::Epic
    } else if popularity < 60.0 {
        Tier::Rare
    } else if popularity < 80.0 {
        Tier::Uncommon
    } else {
        Tier::Common
    }
}
