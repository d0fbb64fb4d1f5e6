//! Tukey IQR outlier filter over listing prices.

use cardvalue_core::config::OutlierConfig;
use cardvalue_core::ListingSet;
use serde::Serialize;
use tracing::debug;

use crate::stats::{quantile_sorted, sorted};

/// Quartiles and fences used by one filtering pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FenceBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl FenceBounds {
    /// Compute fences from prices. `None` below `min_sample` values.
    pub fn from_prices(prices: &[f64], multiplier: f64, min_sample: usize) -> Option<Self> {
        if prices.len() < min_sample.max(1) {
            return None;
        }
        let sorted = sorted(prices);
        let q1 = quantile_sorted(&sorted, 0.25);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        })
    }

    /// Is the price inside the fences (inclusive)?
    #[inline]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}

/// Result of filtering a listing set.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Listings within the fences, in input order.
    pub kept: ListingSet,
    /// Number of listings removed.
    pub removed: usize,
    /// Fences applied, absent when filtering was skipped.
    pub bounds: Option<FenceBounds>,
}

/// IQR outlier filter.
#[derive(Debug, Clone, Default)]
pub struct OutlierFilter {
    config: OutlierConfig,
}

impl OutlierFilter {
    pub fn new(config: OutlierConfig) -> Self {
        Self { config }
    }

    /// Drop listings whose price falls outside the Tukey fences.
    ///
    /// Sets smaller than the configured minimum pass through untouched.
    pub fn filter(&self, listings: &ListingSet) -> FilterOutcome {
        let prices = listings.prices();
        let Some(bounds) = self.bounds(&prices) else {
            debug!(count = listings.len(), "too few listings for outlier filtering");
            return FilterOutcome {
                kept: listings.clone(),
                removed: 0,
                bounds: None,
            };
        };

        let kept = listings.filter(|l| bounds.contains(l.price()));
        let removed = listings.len() - kept.len();
        if removed > 0 {
            debug!(
                removed,
                lower = bounds.lower,
                upper = bounds.upper,
                "removed price outliers"
            );
        }

        FilterOutcome {
            kept,
            removed,
            bounds: Some(bounds),
        }
    }

    /// Same filter over a bare price list.
    pub fn filter_prices(&self, prices: &[f64]) -> Vec<f64> {
        match self.bounds(prices) {
            Some(bounds) => prices.iter().copied().filter(|p| bounds.contains(*p)).collect(),
            None => prices.to_vec(),
        }
    }

    fn bounds(&self, prices: &[f64]) -> Option<FenceBounds> {
        FenceBounds::from_prices(prices, self.config.iqr_multiplier, self.config.min_sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardvalue_core::Listing;

    fn make_set(prices: &[f64]) -> ListingSet {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| Listing::new(format!("card {i}"), *p).unwrap())
            .collect()
    }

    #[test]
    fn test_removes_obvious_outlier() {
        let filter = OutlierFilter::default();
        let outcome = filter.filter(&make_set(&[10.0, 12.0, 11.0, 13.0, 90.0]));

        assert_eq!(outcome.kept.prices(), vec![10.0, 12.0, 11.0, 13.0]);
        assert_eq!(outcome.removed, 1);
        let bounds = outcome.bounds.unwrap();
        assert!((bounds.q1 - 11.0).abs() < 1e-10);
        assert!((bounds.q3 - 13.0).abs() < 1e-10);
        assert!((bounds.upper - 16.0).abs() < 1e-10);
        assert!((bounds.lower - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_small_sets_skip_filtering() {
        let filter = OutlierFilter::default();
        let outcome = filter.filter(&make_set(&[1.0, 100.0, 1000.0]));
        assert_eq!(outcome.kept.len(), 3);
        assert_eq!(outcome.removed, 0);
        assert!(outcome.bounds.is_none());

        let outcome = filter.filter(&ListingSet::default());
        assert!(outcome.kept.is_empty());
    }

    #[test]
    fn test_filtered_range_within_original() {
        let prices = [5.0, 7.5, 8.0, 8.2, 8.4, 9.0, 9.1, 30.0, 0.5, 8.8, 8.9];
        let outcome = OutlierFilter::default().filter(&make_set(&prices));
        let kept = outcome.kept.prices();

        assert!(!kept.is_empty());
        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(kept.iter().all(|p| *p >= min && *p <= max));
        assert_eq!(outcome.removed + kept.len(), prices.len());
    }

    #[test]
    fn test_never_empties_large_enough_sets() {
        let filter = OutlierFilter::new(OutlierConfig {
            iqr_multiplier: 0.0,
            min_sample: 4,
        });
        let outcome = filter.filter(&make_set(&[1.0, 2.0, 50.0, 1000.0]));
        assert!(!outcome.kept.is_empty());
    }

    #[test]
    fn test_filter_prices() {
        let filter = OutlierFilter::default();
        assert_eq!(
            filter.filter_prices(&[10.0, 12.0, 11.0, 13.0, 90.0]),
            vec![10.0, 12.0, 11.0, 13.0]
        );
        assert_eq!(filter.filter_prices(&[5.0, 500.0]), vec![5.0, 500.0]);
    }
}
