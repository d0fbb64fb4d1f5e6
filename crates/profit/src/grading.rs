//! Grade-or-not analysis for a raw card.

use std::fmt;

use cardvalue_core::config::GradingConfig;
use cardvalue_core::MarketMetrics;
use serde::Serialize;

/// Where a projected graded price came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "multiplier")]
pub enum GradedPriceSource {
    /// A supplied graded sale price.
    Observed,
    /// Raw value x the graded/raw median ratio seen in the market.
    MarketMultiplier(f64),
    /// Raw value x the configured heuristic multiplier.
    Heuristic(f64),
}

/// Outcome of the grading analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingVerdict {
    GradeIt,
    ConsiderGrading,
    DontGrade,
}

impl GradingVerdict {
    pub fn label(self) -> &'static str {
        match self {
            GradingVerdict::GradeIt => "GRADE IT!",
            GradingVerdict::ConsiderGrading => "Consider Grading",
            GradingVerdict::DontGrade => "DON'T GRADE",
        }
    }
}

impl fmt::Display for GradingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Projected economics of one target grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeOutlook {
    pub price: f64,
    pub source: GradedPriceSource,
    pub profit: f64,
    /// Profit over break-even, percent. 0 when break-even is not positive.
    pub roi: f64,
}

/// Result of [`GradingAnalyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingAnalysis {
    /// Raw value the projection starts from.
    pub current_value: f64,
    pub grading_fee: f64,
    pub shipping_cost: f64,
    pub total_grading_cost: f64,
    /// Purchase price plus grading cost.
    pub break_even: f64,
    pub psa9: GradeOutlook,
    pub psa10: GradeOutlook,
    pub verdict: GradingVerdict,
}

/// Grading analyzer.
#[derive(Debug, Clone, Default)]
pub struct GradingAnalyzer {
    config: GradingConfig,
}

impl GradingAnalyzer {
    pub fn new(config: GradingConfig) -> Self {
        Self { config }
    }

    /// Project PSA 9 / PSA 10 outcomes for a raw card.
    ///
    /// `purchase_price` defaults to the market average. Observed graded prices
    /// win over the market's graded/raw multipliers, which win over the
    /// configured heuristics.
    pub fn analyze(
        &self,
        metrics: &MarketMetrics,
        purchase_price: Option<f64>,
        psa9_price: Option<f64>,
        psa10_price: Option<f64>,
    ) -> GradingAnalysis {
        let current_value = metrics.avg_price;
        let cost_basis = purchase_price.unwrap_or(current_value);
        let grading_fee = self.config.analyzer_grading_fee;
        let shipping_cost = self.config.analyzer_shipping_cost;
        let total_grading_cost = grading_fee + shipping_cost;
        let break_even = cost_basis + total_grading_cost;

        let outlook = |observed: Option<f64>, market: Option<f64>, heuristic: f64| {
            let (price, source) = match (observed, market) {
                (Some(price), _) => (price, GradedPriceSource::Observed),
                (None, Some(m)) => (current_value * m, GradedPriceSource::MarketMultiplier(m)),
                (None, None) => (current_value * heuristic, GradedPriceSource::Heuristic(heuristic)),
            };
            let profit = price - break_even;
            let roi = if break_even > 0.0 {
                profit / break_even * 100.0
            } else {
                0.0
            };
            GradeOutlook {
                price,
                source,
                profit,
                roi,
            }
        };

        let psa9 = outlook(psa9_price, metrics.psa9_multiplier, self.config.psa9_multiplier);
        let psa10 = outlook(psa10_price, metrics.psa10_multiplier, self.config.psa10_multiplier);

        let verdict = if psa10.profit > total_grading_cost * 2.0 {
            GradingVerdict::GradeIt
        } else if psa9.profit > total_grading_cost {
            GradingVerdict::ConsiderGrading
        } else {
            GradingVerdict::DontGrade
        };

        GradingAnalysis {
            current_value,
            grading_fee,
            shipping_cost,
            total_grading_cost,
            break_even,
            psa9,
            psa10,
            verdict,
        }
    }
}
