use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{CatalogRecord, Tier};

/// Totals over an accepted record set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub count: usize,
    /// Only tiers that occur are present
    pub tier_counts: BTreeMap<Tier, usize>,
    pub total_price: f64,
    /// Zero for an empty set
    pub average_price: f64,
    pub total_tags: usize,
}

/// Tally counts, prices and tags. Never fails; the empty set yields zeros.
pub fn aggregate(records: &[CatalogRecord]) -> BatchStats {
    let mut stats = BatchStats::default();

    for record in records {
        stats.count += 1;
        *stats.tier_counts.entry(record.tier).or_insert(0) += 1;
        stats.total_price += record.price;
        stats.total_tags += record.tags.len();
    }

    stats.total_price = (stats.total_price * 100.0).round() / 100.0;
    if stats.count > 0 {
        stats.average_price = ((stats.total_price / stats.count as f64) * 100.0).round() / 100.0;
    }

    stats
}
