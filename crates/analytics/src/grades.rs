//! Buy/sell letter grades.

use cardvalue_core::{Letter, MarketGrade, MarketScores};

const VOLATILITY_WEIGHT: f64 = 0.3;
const TREND_WEIGHT: f64 = 0.4;
const LIQUIDITY_WEIGHT: f64 = 0.3;

/// Maps market scores to letter grades.
///
/// A buyer wants a calm, flat-or-falling, liquid market; a seller wants a
/// volatile, rising, liquid one.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradeAssigner;

impl GradeAssigner {
    pub fn new() -> Self {
        Self
    }

    /// Buy-side composite in [0, 1].
    pub fn buy_composite(&self, scores: &MarketScores) -> f64 {
        ((10.0 - scores.volatility) * VOLATILITY_WEIGHT
            + (10.0 - scores.trend) * TREND_WEIGHT
            + scores.liquidity * LIQUIDITY_WEIGHT)
            / 10.0
    }

    /// Sell-side composite in [0, 1].
    pub fn sell_composite(&self, scores: &MarketScores) -> f64 {
        (scores.volatility * VOLATILITY_WEIGHT
            + scores.trend * TREND_WEIGHT
            + scores.liquidity * LIQUIDITY_WEIGHT)
            / 10.0
    }

    pub fn assign(&self, scores: &MarketScores) -> MarketGrade {
        MarketGrade {
            buy_grade: Letter::from_composite(self.buy_composite(scores)),
            sell_grade: Letter::from_composite(self.sell_composite(scores)),
        }
    }
}
