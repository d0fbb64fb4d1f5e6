//! Per-variation market breakdown.

use std::collections::BTreeMap;

use cardvalue_core::{ListingSet, MarketMetrics, Variation};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::MetricsCalculator;

/// Metrics for one variation bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariationMetrics {
    /// Variation tag, `None` for untagged (base) listings.
    pub variation: Option<Variation>,
    /// Fraction of the analyzed listings in this bucket.
    pub share: f64,
    pub metrics: MarketMetrics,
}

impl VariationMetrics {
    /// Display label for the bucket.
    pub fn label(&self) -> &'static str {
        self.variation.map_or("base", Variation::keyword)
    }
}

/// Listing counts per tag, untagged listings excluded.
pub fn variation_counts(listings: &ListingSet) -> BTreeMap<Variation, usize> {
    let mut counts = BTreeMap::new();
    for variation in listings.iter().filter_map(|l| l.variation()) {
        *counts.entry(variation).or_insert(0) += 1;
    }
    counts
}

/// The most frequent tag. Ties go to the tag earlier in the vocabulary.
pub fn most_common_variation(listings: &ListingSet) -> Option<Variation> {
    variation_counts(listings)
        .into_iter()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| vb.cmp(va)))
        .map(|(variation, _)| variation)
}

/// Compute metrics independently for every bucket present in the set.
///
/// Buckets are ordered by size, largest first; the untagged bucket, if any,
/// comes last.
pub fn variation_breakdown(
    calculator: &MetricsCalculator,
    listings: &ListingSet,
    now: DateTime<Utc>,
) -> Vec<VariationMetrics> {
    let total = listings.len();
    let mut counts: Vec<(Variation, usize)> = variation_counts(listings).into_iter().collect();
    counts.sort_by(|(va, ca), (vb, cb)| cb.cmp(ca).then_with(|| va.cmp(vb)));

    let share = |n: usize| cardvalue_core::ratio_or_zero(n as f64, total as f64);

    let mut out: Vec<VariationMetrics> = counts
        .into_iter()
        .map(|(variation, count)| VariationMetrics {
            variation: Some(variation),
            share: share(count),
            metrics: calculator.calculate_at(&listings.by_variation(variation), now),
        })
        .collect();

    let untagged = listings.filter(|l| l.variation().is_none());
    if !untagged.is_empty() {
        out.push(VariationMetrics {
            variation: None,
            share: share(untagged.len()),
            metrics: calculator.calculate_at(&untagged, now),
        });
    }
    out
}
