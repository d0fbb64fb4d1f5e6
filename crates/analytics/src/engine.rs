//! Market analysis pipeline.
//!
//! Combines normalization, outlier filtering, metrics, scoring and grading
//! into a single call. Nothing is cached between calls.

use cardvalue_core::{Config, ListingSet, MarketGrade, MarketMetrics, MarketScores, RawListing, Result};
use cardvalue_ingestion::{ListingNormalizer, NormalizationStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    grades::GradeAssigner,
    metrics::MetricsCalculator,
    outlier::{FenceBounds, OutlierFilter},
    projection::PriceProjection,
    scores::ScoreEngine,
    segments::MarketSegments,
    variations::{variation_breakdown, VariationMetrics},
};

/// Full result of analyzing one listing query.
#[derive(Debug, Clone, Serialize)]
pub struct MarketAnalysis {
    pub metrics: MarketMetrics,
    pub scores: MarketScores,
    pub grade: MarketGrade,
    /// Per-variation metrics over the filtered listings.
    pub variations: Vec<VariationMetrics>,
    pub segments: MarketSegments,
    /// Linear projection, absent with too few dated sales.
    pub projection: Option<PriceProjection>,
    /// Listings after normalization.
    pub total_listings: usize,
    /// Listings after outlier filtering.
    pub filtered_listings: usize,
    pub outliers_removed: usize,
    pub fence: Option<FenceBounds>,
    /// Raw records dropped during normalization.
    pub dropped_records: u64,
}

/// Market analyzer.
#[derive(Debug, Clone, Default)]
pub struct MarketAnalyzer {
    config: Config,
    outlier: OutlierFilter,
    metrics: MetricsCalculator,
    scores: ScoreEngine,
    grades: GradeAssigner,
}

impl MarketAnalyzer {
    /// Create an analyzer from a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            outlier: OutlierFilter::new(config.outlier.clone()),
            metrics: MetricsCalculator::new(config.metrics.clone()),
            scores: ScoreEngine::new(config.scoring.clone()),
            grades: GradeAssigner::new(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze raw records against the current time.
    pub fn analyze(&self, raws: &[RawListing]) -> MarketAnalysis {
        self.analyze_at(raws, Utc::now())
    }

    /// Analyze raw records, resolving dates and windows against `now`.
    pub fn analyze_at(&self, raws: &[RawListing], now: DateTime<Utc>) -> MarketAnalysis {
        let mut normalizer = ListingNormalizer::new();
        let listings = normalizer.normalize_batch_at(raws, now);
        let mut analysis = self.analyze_set(&listings, now);
        analysis.dropped_records = normalizer.stats().dropped();
        analysis
    }

    /// Analyze already-normalized listings.
    pub fn analyze_set(&self, listings: &ListingSet, now: DateTime<Utc>) -> MarketAnalysis {
        let outcome = self.outlier.filter(listings);
        let filtered = &outcome.kept;

        let metrics = self.metrics.aggregate_at(filtered, now);
        let scores = self.scores.score(&metrics);
        let grade = self.grades.assign(&scores);

        let metrics_config = self.metrics.config();
        let projection = PriceProjection::project(
            filtered,
            metrics_config.projection_days_ahead,
            metrics_config.projection_min_sales,
            metrics.coefficient_of_variation(),
        );

        debug!(
            listings = listings.len(),
            filtered = filtered.len(),
            sentiment = scores.sentiment,
            buy = %grade.buy_grade,
            sell = %grade.sell_grade,
            "market analyzed"
        );

        MarketAnalysis {
            variations: variation_breakdown(&self.metrics, filtered, now),
            segments: MarketSegments::analyze(filtered, &metrics_config.temporal_windows_days, now),
            projection,
            total_listings: listings.len(),
            filtered_listings: filtered.len(),
            outliers_removed: outcome.removed,
            fence: outcome.bounds,
            dropped_records: 0,
            metrics,
            scores,
            grade,
        }
    }

    /// Normalization statistics for a batch without running the analysis.
    pub fn normalization_stats(&self, raws: &[RawListing], now: DateTime<Utc>) -> NormalizationStats {
        let mut normalizer = ListingNormalizer::new();
        normalizer.normalize_batch_at(raws, now);
        normalizer.stats().clone()
    }
}
