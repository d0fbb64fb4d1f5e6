//! Configuration structures for the valuation engine.
//!
//! Every scoring constant lives here under one name with one canonical
//! default. Sections deserialize independently, so a JSON document only needs
//! to carry the fields it overrides.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest trend, segment or projection window accepted, in days.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outlier filter configuration.
    pub outlier: OutlierConfig,
    /// Metrics calculator configuration.
    pub metrics: MetricsConfig,
    /// Score engine configuration.
    pub scoring: ScoringConfig,
    /// Profit / grading calculator configuration.
    pub grading: GradingConfig,
}

impl Config {
    /// Load a configuration from JSON, filling omitted fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        self.outlier.validate()?;
        self.metrics.validate()?;
        self.scoring.validate()?;
        self.grading.validate()?;
        Ok(())
    }
}

/// Tukey fence configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Fence width in IQRs.
    pub iqr_multiplier: f64,
    /// Minimum listings required before filtering is attempted.
    pub min_sample: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            min_sample: 4,
        }
    }
}

impl OutlierConfig {
    fn validate(&self) -> Result<()> {
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier >= 0.0) {
            return Err(Error::config("outlier.iqr_multiplier must be >= 0"));
        }
        if self.min_sample < 4 {
            return Err(Error::config("outlier.min_sample must be at least 4"));
        }
        Ok(())
    }
}

/// How the headline metrics pick their listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    /// Every filtered listing contributes.
    #[default]
    AllVariations,
    /// Only the most frequent variation represents the market.
    MostCommonVariation,
}

/// Metrics calculator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Length of the "recent" trend window in days.
    pub trend_window_days: i64,
    /// Aggregate selection.
    pub aggregate: AggregateMode,
    /// Temporal windows reported by the segment analysis, in days.
    pub temporal_windows_days: Vec<i64>,
    /// Minimum dated sales for a price projection.
    pub projection_min_sales: usize,
    /// Projection horizon in days.
    pub projection_days_ahead: i64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            trend_window_days: 30,
            aggregate: AggregateMode::AllVariations,
            temporal_windows_days: vec![7, 30, 90],
            projection_min_sales: 10,
            projection_days_ahead: 30,
        }
    }
}

impl MetricsConfig {
    fn validate(&self) -> Result<()> {
        let in_range = |days: i64| (1..=MAX_WINDOW_DAYS).contains(&days);
        if !in_range(self.trend_window_days) {
            return Err(Error::config(format!(
                "metrics.trend_window_days must be within [1, {MAX_WINDOW_DAYS}]"
            )));
        }
        if !self.temporal_windows_days.iter().all(|d| in_range(*d)) {
            return Err(Error::config(format!(
                "metrics.temporal_windows_days must be within [1, {MAX_WINDOW_DAYS}]"
            )));
        }
        if !(0..=MAX_WINDOW_DAYS).contains(&self.projection_days_ahead) {
            return Err(Error::config(format!(
                "metrics.projection_days_ahead must be within [0, {MAX_WINDOW_DAYS}]"
            )));
        }
        if self.projection_min_sales < 3 {
            return Err(Error::config("metrics.projection_min_sales must be at least 3"));
        }
        Ok(())
    }
}

/// Composite sentiment weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentWeights {
    pub trend: f64,
    pub momentum: f64,
    pub liquidity: f64,
    pub stability: f64,
    pub volume: f64,
}

impl Default for SentimentWeights {
    fn default() -> Self {
        Self {
            trend: 0.3,
            momentum: 0.2,
            liquidity: 0.2,
            stability: 0.2,
            volume: 0.1,
        }
    }
}

impl SentimentWeights {
    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.trend + self.momentum + self.liquidity + self.stability + self.volume
    }
}

/// Score engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Volatility score = CV x this.
    pub volatility_scale: f64,
    /// Stability score = 10 - CV x this.
    pub stability_scale: f64,
    /// Liquidity score = sale count / this.
    pub liquidity_divisor: f64,
    /// Sale count that earns a full volume score.
    pub volume_ceiling: f64,
    /// Trend score = 5 + trend ratio x this.
    pub trend_scale: f64,
    /// Momentum score = 5 + momentum x this.
    pub momentum_scale: f64,
    /// Composite sentiment weights.
    pub weights: SentimentWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            volatility_scale: 10.0,
            stability_scale: 5.0,
            liquidity_divisor: 10.0,
            volume_ceiling: 10.0,
            trend_scale: 5.0,
            momentum_scale: 5.0,
            weights: SentimentWeights::default(),
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<()> {
        if self.liquidity_divisor <= 0.0 {
            return Err(Error::config("scoring.liquidity_divisor must be positive"));
        }
        if self.volume_ceiling <= 0.0 {
            return Err(Error::config("scoring.volume_ceiling must be positive"));
        }
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-9 {
            return Err(Error::config(format!(
                "scoring.weights must sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }
}

/// Grading service tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingService {
    #[default]
    Economy,
    Regular,
    Express,
}

impl GradingService {
    /// Parse a tier name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "economy" => Some(GradingService::Economy),
            "regular" => Some(GradingService::Regular),
            "express" => Some(GradingService::Express),
            _ => None,
        }
    }
}

/// Fee and turnaround of a grading tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTier {
    pub cost: f64,
    pub turnaround_days: u32,
}

/// Profit / grading calculator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
    /// Estimated PSA 9 price = raw price x this, when no PSA 9 sales exist.
    pub psa9_multiplier: f64,
    /// Estimated PSA 10 price = raw price x this, when no PSA 10 sales exist.
    pub psa10_multiplier: f64,
    /// Base probability of a PSA 9 outcome.
    pub psa9_probability: f64,
    /// Base probability of a PSA 10 outcome.
    pub psa10_probability: f64,
    /// Base probability of landing below the target grade.
    pub lower_grade_probability: f64,
    /// Cap on the condition-adjusted PSA 9 probability.
    pub psa9_probability_cap: f64,
    /// Cap on the condition-adjusted PSA 10 probability.
    pub psa10_probability_cap: f64,
    /// Marketplace fee rate for an immediate sale when a request does not carry one.
    pub default_fee_rate: f64,
    /// Fee rate for grading scenarios when a request does not carry one.
    pub grading_fee_rate: f64,
    pub economy: ServiceTier,
    pub regular: ServiceTier,
    pub express: ServiceTier,
    /// Grading fee assumed by the grading analyzer.
    pub analyzer_grading_fee: f64,
    /// Shipping cost assumed by the grading analyzer.
    pub analyzer_shipping_cost: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            psa9_multiplier: 1.5,
            psa10_multiplier: 3.0,
            psa9_probability: 0.50,
            psa10_probability: 0.20,
            lower_grade_probability: 0.30,
            psa9_probability_cap: 0.95,
            psa10_probability_cap: 0.90,
            default_fee_rate: 0.129,
            grading_fee_rate: 0.0,
            economy: ServiceTier {
                cost: 50.0,
                turnaround_days: 30,
            },
            regular: ServiceTier {
                cost: 100.0,
                turnaround_days: 15,
            },
            express: ServiceTier {
                cost: 200.0,
                turnaround_days: 5,
            },
            analyzer_grading_fee: 25.0,
            analyzer_shipping_cost: 10.0,
        }
    }
}

impl GradingConfig {
    /// Fee and turnaround for a service tier.
    pub fn tier(&self, service: GradingService) -> &ServiceTier {
        match service {
            GradingService::Economy => &self.economy,
            GradingService::Regular => &self.regular,
            GradingService::Express => &self.express,
        }
    }

    fn validate(&self) -> Result<()> {
        let probabilities = [
            ("psa9_probability", self.psa9_probability),
            ("psa10_probability", self.psa10_probability),
            ("lower_grade_probability", self.lower_grade_probability),
            ("psa9_probability_cap", self.psa9_probability_cap),
            ("psa10_probability_cap", self.psa10_probability_cap),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::config(format!("grading.{name} must be within [0, 1]")));
            }
        }
        if self.psa9_multiplier <= 0.0 || self.psa10_multiplier <= 0.0 {
            return Err(Error::config("grading multipliers must be positive"));
        }
        if !(0.0..1.0).contains(&self.default_fee_rate) {
            return Err(Error::config("grading.default_fee_rate must be within [0, 1)"));
        }
        if !(0.0..1.0).contains(&self.grading_fee_rate) {
            return Err(Error::config("grading.grading_fee_rate must be within [0, 1)"));
        }
        Ok(())
    }
}
