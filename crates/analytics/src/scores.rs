//! Market health scores.
//!
//! Maps metrics onto six 0-10 dimensions and a weighted composite sentiment.

use cardvalue_core::config::ScoringConfig;
use cardvalue_core::{clamp_score, MarketMetrics, MarketScores, NEUTRAL_SCORE};

/// Score engine.
#[derive(Debug, Clone, Default)]
pub struct ScoreEngine {
    config: ScoringConfig,
}

impl ScoreEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score a metrics snapshot. Every dimension lands in [0, 10].
    pub fn score(&self, metrics: &MarketMetrics) -> MarketScores {
        if metrics.sale_count == 0 {
            return self.with_sentiment(MarketScores::neutral());
        }

        let cfg = &self.config;
        let cv = metrics.coefficient_of_variation();
        let count = metrics.sale_count as f64;

        let scores = MarketScores {
            volatility: clamp_score(cv * cfg.volatility_scale),
            trend: clamp_score(NEUTRAL_SCORE + metrics.trend_ratio * cfg.trend_scale),
            liquidity: clamp_score(count / cfg.liquidity_divisor),
            momentum: clamp_score(NEUTRAL_SCORE + metrics.momentum * cfg.momentum_scale),
            stability: clamp_score(10.0 - cv * cfg.stability_scale),
            volume: clamp_score(count / cfg.volume_ceiling * 10.0),
            sentiment: 0.0,
        };
        self.with_sentiment(scores)
    }

    /// Weighted combination of the dimension scores.
    pub fn sentiment(&self, scores: &MarketScores) -> f64 {
        let w = &self.config.weights;
        clamp_score(
            w.trend * scores.trend
                + w.momentum * scores.momentum
                + w.liquidity * scores.liquidity
                + w.stability * scores.stability
                + w.volume * scores.volume,
        )
    }

    fn with_sentiment(&self, mut scores: MarketScores) -> MarketScores {
        scores.sentiment = self.sentiment(&scores);
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cardvalue_core::config::SentimentWeights;

    fn make_metrics(count: usize, avg: f64, std: f64) -> MarketMetrics {
        MarketMetrics {
            sale_count: count,
            avg_price: avg,
            median_price: avg,
            std_price: std,
            min_price: avg - std,
            max_price: avg + std,
            ..Default::default()
        }
    }

    fn assert_in_range(scores: &MarketScores) {
        for value in scores.dimensions() {
            assert!((0.0..=10.0).contains(&value), "score {value} out of range");
        }
        assert!((0.0..=10.0).contains(&scores.sentiment));
    }

    #[test]
    fn test_empty_metrics_are_neutral() {
        let scores = ScoreEngine::default().score(&MarketMetrics::empty());
        assert_eq!(scores.volatility, 5.0);
        assert_eq!(scores.trend, 5.0);
        assert_eq!(scores.momentum, 5.0);
        assert_eq!(scores.stability, 5.0);
        assert_eq!(scores.liquidity, 0.0);
        assert_eq!(scores.volume, 0.0);
        assert_relative_eq!(scores.sentiment, 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_sentiment_follows_weights() {
        let config = ScoringConfig {
            weights: SentimentWeights {
                trend: 0.5,
                momentum: 0.0,
                liquidity: 0.0,
                stability: 0.5,
                volume: 0.0,
            },
            ..ScoringConfig::default()
        };
        let scores = ScoreEngine::new(config).score(&MarketMetrics::empty());
        assert_relative_eq!(scores.sentiment, 5.0, epsilon = 1e-12);
        assert_eq!(MarketScores::neutral().sentiment, 0.0);
    }

    #[test]
    fn test_single_listing() {
        let scores = ScoreEngine::default().score(&make_metrics(1, 40.0, 0.0));
        assert_eq!(scores.volatility, 0.0);
        assert_eq!(scores.stability, 10.0);
        assert_eq!(scores.trend, 5.0);
        assert_eq!(scores.momentum, 5.0);
        assert_relative_eq!(scores.liquidity, 0.1);
        assert_relative_eq!(scores.volume, 1.0);
    }

    #[test]
    fn test_dimension_formulas() {
        let mut metrics = make_metrics(25, 100.0, 20.0);
        metrics.trend_ratio = 0.2;
        metrics.momentum = -0.4;

        let scores = ScoreEngine::default().score(&metrics);

        assert_relative_eq!(scores.volatility, 2.0, epsilon = 1e-12);
        assert_relative_eq!(scores.stability, 9.0, epsilon = 1e-12);
        assert_relative_eq!(scores.trend, 6.0, epsilon = 1e-12);
        assert_relative_eq!(scores.momentum, 3.0, epsilon = 1e-12);
        assert_relative_eq!(scores.liquidity, 2.5, epsilon = 1e-12);
        assert_relative_eq!(scores.volume, 10.0, epsilon = 1e-12);
        let expected = 0.3 * 6.0 + 0.2 * 3.0 + 0.2 * 2.5 + 0.2 * 9.0 + 0.1 * 10.0;
        assert_relative_eq!(scores.sentiment, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_extreme_inputs_clamped() {
        let engine = ScoreEngine::default();
        let mut metrics = make_metrics(10_000, 1.0, 50.0);
        metrics.trend_ratio = 1e9;
        metrics.momentum = -1e9;
        let scores = engine.score(&metrics);
        assert_in_range(&scores);
        assert_eq!(scores.volatility, 10.0);
        assert_eq!(scores.stability, 0.0);
        assert_eq!(scores.trend, 10.0);
        assert_eq!(scores.momentum, 0.0);

        metrics.trend_ratio = f64::NAN;
        assert_in_range(&engine.score(&metrics));
    }

    #[test]
    fn test_scores_in_range_sweep() {
        let engine = ScoreEngine::default();
        for count in [0, 1, 2, 7, 50, 500] {
            for (avg, std) in [(0.0, 0.0), (10.0, 0.5), (10.0, 30.0), (1e6, 1.0)] {
                for trend in [-1.0, 0.0, 0.5, 3.0] {
                    let mut metrics = make_metrics(count, avg, std);
                    metrics.trend_ratio = trend;
                    metrics.momentum = -trend;
                    assert_in_range(&engine.score(&metrics));
                }
            }
        }
    }
}
