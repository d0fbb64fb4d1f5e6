//! Profit and grading expected-value calculator.
//!
//! Two scenario families:
//! - Immediate sale of the raw card at the cleaned market median
//! - Grading, where the sale value is weighted by the chance of hitting the
//!   target grade

use cardvalue_analytics::stats::median;
use cardvalue_analytics::OutlierFilter;
use cardvalue_core::config::{GradingConfig, GradingService, OutlierConfig};
use cardvalue_core::{
    Config, Error, GradeClass, ListingSet, MarketMetrics, PriceSource, ProfitScenario, Result,
    RiskLevel, ScenarioType,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::CardCondition;

/// Which scenario to evaluate, parsed from its marketplace name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    Raw,
    Psa9,
    Psa10,
}

impl Scenario {
    /// Parse "Raw", "PSA 9" or "PSA 10" (case and spacing insensitive).
    pub fn parse(name: &str) -> Result<Self> {
        let compact: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match compact.as_str() {
            "raw" => Ok(Scenario::Raw),
            "psa9" => Ok(Scenario::Psa9),
            "psa10" => Ok(Scenario::Psa10),
            _ => Err(Error::config(format!("unknown scenario {name:?}"))),
        }
    }

    /// Target grade for grading scenarios.
    pub fn target_grade(self) -> Option<GradeClass> {
        match self {
            Scenario::Raw => None,
            Scenario::Psa9 => Some(GradeClass::Psa9),
            Scenario::Psa10 => Some(GradeClass::Psa10),
        }
    }
}

/// Inputs for one profit calculation. Every field is optional in spirit:
/// absent data resolves to zero or to a configured default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInput {
    /// "Raw", "PSA 9" or "PSA 10".
    pub scenario: String,
    pub purchase_price: f64,
    pub shipping_cost: f64,
    /// Marketplace fee as a fraction of the sale price (0.129 = 12.9%).
    pub fee_rate: Option<f64>,
    /// Median of the raw market, when an analysis is available.
    pub raw_market_median: Option<f64>,
    /// Observed raw sale prices.
    pub raw_sales: Vec<f64>,
    /// Observed sale prices at the target grade.
    pub graded_sales: Vec<f64>,
    pub grading_service: GradingService,
    /// Explicit grading fee, overriding the service tier cost.
    pub grading_fee: Option<f64>,
    pub condition: Option<CardCondition>,
}

impl ScenarioInput {
    pub fn new(scenario: impl Into<String>, purchase_price: f64) -> Self {
        Self {
            scenario: scenario.into(),
            purchase_price,
            ..Default::default()
        }
    }

    pub fn with_shipping(mut self, shipping_cost: f64) -> Self {
        self.shipping_cost = shipping_cost;
        self
    }

    pub fn with_fee_rate(mut self, fee_rate: f64) -> Self {
        self.fee_rate = Some(fee_rate);
        self
    }

    pub fn with_grading_fee(mut self, grading_fee: f64) -> Self {
        self.grading_fee = Some(grading_fee);
        self
    }

    pub fn with_grading_service(mut self, service: GradingService) -> Self {
        self.grading_service = service;
        self
    }

    pub fn with_condition(mut self, condition: CardCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Take the raw market median from an analysis. Empty metrics are ignored.
    pub fn with_market_metrics(mut self, metrics: &MarketMetrics) -> Self {
        if metrics.sale_count > 0 {
            self.raw_market_median = Some(metrics.median_price);
        }
        self
    }

    /// Split observed listings into raw sales and target-grade sales.
    pub fn with_listings(mut self, listings: &ListingSet) -> Self {
        self.raw_sales = listings.by_grade(GradeClass::Raw).prices();
        if let Ok(Some(grade)) = Scenario::parse(&self.scenario).map(Scenario::target_grade) {
            self.graded_sales = listings.by_grade(grade).prices();
        }
        self
    }
}

/// Profit calculator.
#[derive(Debug, Clone, Default)]
pub struct ProfitCalculator {
    grading: GradingConfig,
    outlier: OutlierFilter,
}

impl ProfitCalculator {
    pub fn new(grading: GradingConfig, outlier: OutlierConfig) -> Self {
        Self {
            grading,
            outlier: OutlierFilter::new(outlier),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.grading.clone(), config.outlier.clone()))
    }

    /// Evaluate the named scenario.
    ///
    /// Fails only on an unknown scenario name or an unusable fee rate.
    pub fn calculate_profit(&self, input: &ScenarioInput) -> Result<ProfitScenario> {
        let scenario = Scenario::parse(&input.scenario)?;
        let default_fee_rate = match scenario {
            Scenario::Raw => self.grading.default_fee_rate,
            Scenario::Psa9 | Scenario::Psa10 => self.grading.grading_fee_rate,
        };
        let fee_rate = input.fee_rate.unwrap_or(default_fee_rate);
        if !fee_rate.is_finite() || fee_rate < 0.0 {
            return Err(Error::config(format!("fee rate must be >= 0, got {fee_rate}")));
        }

        let result = match scenario.target_grade() {
            None => self.immediate_sale(input, fee_rate),
            Some(grade) => self.grading(input, grade, fee_rate),
        };
        debug!(
            scenario = %input.scenario,
            net_profit = result.net_profit,
            roi = result.roi,
            "profit scenario computed"
        );
        Ok(result)
    }

    /// Sell the raw card now.
    pub fn immediate_sale(&self, input: &ScenarioInput, fee_rate: f64) -> ProfitScenario {
        let (market_price, price_source, sales_count) = match self.cleaned_median(&input.raw_sales) {
            Some((median, count)) => (median, PriceSource::Historical, count),
            None => (
                input.raw_market_median.unwrap_or(0.0),
                PriceSource::Estimated,
                0,
            ),
        };

        let purchase = input.purchase_price;
        let base_costs = purchase + input.shipping_cost;
        let fee_amount = market_price * fee_rate;
        let total_costs = base_costs + fee_amount;
        let net_profit = market_price - total_costs;
        let roi = if purchase > 0.0 {
            net_profit / purchase * 100.0
        } else {
            0.0
        };

        ProfitScenario {
            scenario_type: ScenarioType::ImmediateSale,
            target_grade: None,
            market_price,
            price_source,
            sales_count,
            purchase_price: purchase,
            base_costs,
            total_costs,
            fee_amount,
            expected_value: market_price,
            net_profit,
            roi,
            break_even_price: break_even(base_costs, fee_rate),
            success_probability: None,
            lower_grade_probability: None,
            grading_fee: None,
            turnaround_days: None,
            risk_level: RiskLevel::Low,
        }
    }

    /// Grade the card, then sell it.
    pub fn grading(&self, input: &ScenarioInput, target: GradeClass, fee_rate: f64) -> ProfitScenario {
        let cfg = &self.grading;
        let (base_probability, cap, multiplier) = match target {
            GradeClass::Psa9 => (cfg.psa9_probability, cfg.psa9_probability_cap, cfg.psa9_multiplier),
            _ => (cfg.psa10_probability, cfg.psa10_probability_cap, cfg.psa10_multiplier),
        };

        let (market_price, price_source, sales_count) = match self.cleaned_median(&input.graded_sales) {
            Some((median, count)) => (median, PriceSource::Historical, count),
            None => {
                let raw_price = input.raw_market_median.unwrap_or(input.purchase_price);
                (raw_price * multiplier, PriceSource::Estimated, 0)
            }
        };

        let condition = input
            .condition
            .map_or(1.0, CardCondition::probability_multiplier);
        let success_probability = (base_probability * condition).min(cap);
        let lower_grade_probability = (cfg.lower_grade_probability * (2.0 - condition)).max(0.05);

        let tier = cfg.tier(input.grading_service);
        let grading_fee = input.grading_fee.unwrap_or(tier.cost);

        let purchase = input.purchase_price;
        let total_costs = purchase + grading_fee + input.shipping_cost;
        let expected_value = market_price * success_probability;
        let fee_amount = expected_value * fee_rate;
        let net_profit = expected_value - total_costs - fee_amount;
        let break_even_price = break_even(total_costs, fee_rate);
        let roi = if break_even_price > 0.0 && break_even_price.is_finite() {
            net_profit / break_even_price * 100.0
        } else {
            0.0
        };

        ProfitScenario {
            scenario_type: ScenarioType::Grading,
            target_grade: Some(target),
            market_price,
            price_source,
            sales_count,
            purchase_price: purchase,
            base_costs: total_costs,
            total_costs,
            fee_amount,
            expected_value,
            net_profit,
            roi,
            break_even_price,
            success_probability: Some(success_probability),
            lower_grade_probability: Some(lower_grade_probability),
            grading_fee: Some(grading_fee),
            turnaround_days: Some(tier.turnaround_days),
            risk_level: RiskLevel::High,
        }
    }

    /// Median of the IQR-cleaned prices and how many survived.
    fn cleaned_median(&self, prices: &[f64]) -> Option<(f64, usize)> {
        let valid: Vec<f64> = prices.iter().copied().filter(|p| p.is_finite() && *p > 0.0).collect();
        let cleaned = self.outlier.filter_prices(&valid);
        if cleaned.is_empty() {
            None
        } else {
            Some((median(&cleaned), cleaned.len()))
        }
    }
}

/// Sale price needed to recover `costs` after the fee.
pub fn break_even(costs: f64, fee_rate: f64) -> f64 {
    if fee_rate >= 1.0 {
        f64::INFINITY
    } else {
        costs / (1.0 - fee_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cardvalue_core::Listing;

    #[test]
    fn test_immediate_sale_example() {
        let input = ScenarioInput {
            raw_market_median: Some(150.0),
            ..ScenarioInput::new("Raw", 100.0)
                .with_shipping(5.0)
                .with_fee_rate(0.129)
        };

        let result = ProfitCalculator::default().calculate_profit(&input).unwrap();

        assert_eq!(result.scenario_type, ScenarioType::ImmediateSale);
        assert_relative_eq!(result.fee_amount, 19.35, epsilon = 1e-9);
        assert_relative_eq!(result.total_costs, 124.35, epsilon = 1e-9);
        assert_relative_eq!(result.net_profit, 25.65, epsilon = 1e-9);
        assert_relative_eq!(result.roi, 25.65, epsilon = 1e-9);
        assert_relative_eq!(result.break_even_price, 105.0 / 0.871, epsilon = 1e-9);
        assert_eq!(result.price_source, PriceSource::Estimated);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_grading_example() {
        let input = ScenarioInput {
            raw_market_median: Some(50.0),
            ..ScenarioInput::new("PSA 10", 100.0)
                .with_grading_fee(25.0)
                .with_shipping(10.0)
        };

        let result = ProfitCalculator::default().calculate_profit(&input).unwrap();

        assert_eq!(result.target_grade, Some(GradeClass::Psa10));
        assert_relative_eq!(result.market_price, 150.0);
        assert_eq!(result.price_source, PriceSource::Estimated);
        assert_relative_eq!(result.success_probability.unwrap(), 0.2);
        assert_relative_eq!(result.expected_value, 30.0, epsilon = 1e-9);
        assert_relative_eq!(result.total_costs, 135.0);
        assert_eq!(result.fee_amount, 0.0);
        assert_relative_eq!(result.net_profit, -105.0, epsilon = 1e-9);
        assert_relative_eq!(result.break_even_price, 135.0);
        assert_relative_eq!(result.roi, -105.0 / 135.0 * 100.0, epsilon = 1e-9);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_fee_rate_defaults_per_scenario() {
        let calc = ProfitCalculator::default();
        let raw = ScenarioInput {
            raw_market_median: Some(100.0),
            ..ScenarioInput::new("Raw", 50.0)
        };
        assert_relative_eq!(calc.calculate_profit(&raw).unwrap().fee_amount, 12.9, epsilon = 1e-9);

        let graded = ScenarioInput {
            raw_market_median: Some(50.0),
            ..ScenarioInput::new("PSA 10", 100.0)
                .with_grading_fee(25.0)
                .with_shipping(10.0)
                .with_fee_rate(0.1)
        };
        let result = calc.calculate_profit(&graded).unwrap();
        assert_relative_eq!(result.fee_amount, 3.0, epsilon = 1e-9);
        assert_relative_eq!(result.net_profit, -108.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_scenario_is_config_error() {
        let err = ProfitCalculator::default()
            .calculate_profit(&ScenarioInput::new("BGS 9.5", 10.0))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_scenario_names() {
        assert_eq!(Scenario::parse("raw").unwrap(), Scenario::Raw);
        assert_eq!(Scenario::parse("psa 9").unwrap(), Scenario::Psa9);
        assert_eq!(Scenario::parse("PSA10").unwrap(), Scenario::Psa10);
    }

    #[test]
    fn test_missing_inputs_are_zero_not_errors() {
        let result = ProfitCalculator::default()
            .calculate_profit(&ScenarioInput::new("Raw", 0.0))
            .unwrap();
        assert_eq!(result.market_price, 0.0);
        assert_eq!(result.net_profit, 0.0);
        assert_eq!(result.roi, 0.0);
        assert_eq!(result.sales_count, 0);
    }

    #[test]
    fn test_historical_price_uses_cleaned_median() {
        let input = ScenarioInput {
            raw_sales: vec![10.0, 12.0, 11.0, 13.0, 90.0],
            ..ScenarioInput::new("Raw", 8.0).with_fee_rate(0.0)
        };
        let result = ProfitCalculator::default().calculate_profit(&input).unwrap();

        assert_eq!(result.price_source, PriceSource::Historical);
        assert_eq!(result.sales_count, 4);
        assert_relative_eq!(result.market_price, 11.5);
    }

    #[test]
    fn test_graded_sales_preferred_over_estimate() {
        let listings = ListingSet::new(vec![
            Listing::new("raw", 50.0).unwrap(),
            Listing::new("slab", 200.0).unwrap().with_grade(GradeClass::Psa9),
            Listing::new("slab", 220.0).unwrap().with_grade(GradeClass::Psa9),
        ]);
        let input = ScenarioInput::new("PSA 9", 40.0)
            .with_fee_rate(0.0)
            .with_listings(&listings);

        let result = ProfitCalculator::default().calculate_profit(&input).unwrap();

        assert_eq!(result.price_source, PriceSource::Historical);
        assert_eq!(result.sales_count, 2);
        assert_relative_eq!(result.market_price, 210.0);
        assert_relative_eq!(result.expected_value, 105.0);
    }

    #[test]
    fn test_condition_adjusts_probabilities() {
        let calc = ProfitCalculator::default();
        let mint = calc
            .calculate_profit(
                &ScenarioInput::new("PSA 9", 10.0).with_condition(CardCondition::NearMintMint),
            )
            .unwrap();
        assert_relative_eq!(mint.success_probability.unwrap(), 0.7, epsilon = 1e-12);
        assert_relative_eq!(mint.lower_grade_probability.unwrap(), 0.18, epsilon = 1e-12);

        let poor = calc
            .calculate_profit(&ScenarioInput::new("PSA 10", 10.0).with_condition(CardCondition::Poor))
            .unwrap();
        assert_relative_eq!(poor.success_probability.unwrap(), 0.01, epsilon = 1e-12);
        assert_relative_eq!(poor.lower_grade_probability.unwrap(), 0.585, epsilon = 1e-12);
    }

    #[test]
    fn test_probability_caps() {
        let mut grading = GradingConfig::default();
        grading.psa9_probability = 0.8;
        let calc = ProfitCalculator::new(grading, OutlierConfig::default());
        let result = calc
            .calculate_profit(
                &ScenarioInput::new("PSA 9", 10.0).with_condition(CardCondition::NearMintMint),
            )
            .unwrap();
        assert_relative_eq!(result.success_probability.unwrap(), 0.95);
    }

    #[test]
    fn test_service_tier_fee_and_turnaround() {
        let result = ProfitCalculator::default()
            .calculate_profit(
                &ScenarioInput::new("PSA 10", 10.0).with_grading_service(GradingService::Express),
            )
            .unwrap();
        assert_eq!(result.grading_fee, Some(200.0));
        assert_eq!(result.turnaround_days, Some(5));
    }

    #[test]
    fn test_full_fee_break_even_is_infinite() {
        let result = ProfitCalculator::default()
            .calculate_profit(&ScenarioInput::new("PSA 9", 10.0).with_fee_rate(1.0))
            .unwrap();
        assert!(result.break_even_price.is_infinite());
        assert_eq!(result.roi, 0.0);

        assert!(break_even(100.0, 1.5).is_infinite());
    }

    #[test]
    fn test_negative_fee_rejected() {
        let err = ProfitCalculator::default()
            .calculate_profit(&ScenarioInput::new("Raw", 10.0).with_fee_rate(-0.1))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_input_from_json() {
        let input: ScenarioInput = serde_json::from_str(
            r#"{"scenario": "Raw", "purchase_price": 100.0, "shipping_cost": 5.0,
                "fee_rate": 0.129, "raw_market_median": 150.0}"#,
        )
        .unwrap();
        assert_eq!(input.grading_service, GradingService::default());

        let result = ProfitCalculator::default().calculate_profit(&input).unwrap();
        assert_relative_eq!(result.net_profit, 25.65, epsilon = 1e-9);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["scenario_type"], serde_json::to_value(ScenarioType::ImmediateSale).unwrap());
    }
}
