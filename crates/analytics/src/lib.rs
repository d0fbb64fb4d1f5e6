//! Market analytics for the card valuation engine.
//!
//! This crate handles:
//! - IQR outlier filtering
//! - Descriptive metrics, trend and momentum
//! - Per-variation breakdowns
//! - Price brackets and temporal windows
//! - Linear price projection
//! - 0-10 market scores and buy/sell letter grades

pub mod stats;
pub mod outlier;
pub mod metrics;
pub mod variations;
pub mod segments;
pub mod projection;
pub mod scores;
pub mod grades;
pub mod engine;

pub use outlier::{FenceBounds, FilterOutcome, OutlierFilter};
pub use metrics::MetricsCalculator;
pub use variations::{most_common_variation, variation_breakdown, VariationMetrics};
pub use segments::{MarketSegments, PriceBracket, TemporalWindow};
pub use projection::PriceProjection;
pub use scores::ScoreEngine;
pub use grades::GradeAssigner;
pub use engine::{MarketAnalysis, MarketAnalyzer};
