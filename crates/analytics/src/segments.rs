//! Market segmentation by price bracket and by recency.

use cardvalue_core::{ratio_or_zero, ListingSet};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::days_before;
use crate::stats::{mean, quantile_sorted, sorted};

const BRACKET_LABELS: [&str; 4] = ["Low", "Medium-Low", "Medium-High", "High"];

/// Listings between two price quartiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBracket {
    pub label: &'static str,
    /// Lowest observed price in the bracket.
    pub min_price: f64,
    /// Highest observed price in the bracket.
    pub max_price: f64,
    pub volume: usize,
    pub avg_price: f64,
}

/// Sales inside a trailing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalWindow {
    pub days: i64,
    pub avg_price: f64,
    pub volume: usize,
    /// (window avg - overall avg) / overall avg.
    pub price_change: f64,
}

/// Bracket and recency segmentation of one listing set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketSegments {
    /// Quartile brackets, empty below four listings. Empty brackets are omitted.
    pub price_brackets: Vec<PriceBracket>,
    /// One entry per configured window that saw at least one sale.
    pub temporal_windows: Vec<TemporalWindow>,
}

impl MarketSegments {
    /// Segment listings using the given trailing windows.
    pub fn analyze(listings: &ListingSet, windows_days: &[i64], now: DateTime<Utc>) -> Self {
        Self {
            price_brackets: price_brackets(&listings.prices()),
            temporal_windows: temporal_windows(listings, windows_days, now),
        }
    }
}

/// Split prices at the quartiles. Each bracket is right-closed, the first also
/// includes the minimum.
pub fn price_brackets(prices: &[f64]) -> Vec<PriceBracket> {
    if prices.len() < 4 {
        return Vec::new();
    }
    let sorted = sorted(prices);
    let edges = [0.25, 0.5, 0.75].map(|q| quantile_sorted(&sorted, q));

    let mut buckets: [Vec<f64>; 4] = Default::default();
    for price in sorted {
        let idx = edges.iter().position(|edge| price <= *edge).unwrap_or(3);
        buckets[idx].push(price);
    }

    buckets
        .iter()
        .zip(BRACKET_LABELS)
        .filter(|(bucket, _)| !bucket.is_empty())
        .map(|(bucket, label)| PriceBracket {
            label,
            min_price: bucket[0],
            max_price: bucket[bucket.len() - 1],
            volume: bucket.len(),
            avg_price: mean(bucket),
        })
        .collect()
}

/// Average and volume over each trailing window.
pub fn temporal_windows(
    listings: &ListingSet,
    windows_days: &[i64],
    now: DateTime<Utc>,
) -> Vec<TemporalWindow> {
    let overall_avg = mean(&listings.prices());
    let dated = listings.dated_prices();

    windows_days
        .iter()
        .filter_map(|&days| {
            let since = days_before(now, days);
            let prices: Vec<f64> = dated
                .iter()
                .filter(|(date, _)| *date >= since)
                .map(|(_, price)| *price)
                .collect();
            if prices.is_empty() {
                return None;
            }
            let avg_price = mean(&prices);
            Some(TemporalWindow {
                days,
                avg_price,
                volume: prices.len(),
                price_change: ratio_or_zero(avg_price - overall_avg, overall_avg),
            })
        })
        .collect()
}
