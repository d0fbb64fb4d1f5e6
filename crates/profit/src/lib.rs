//! Profit and grading decisions for the card valuation engine.
//!
//! This crate handles:
//! - Immediate-sale and grading expected-value scenarios
//! - Condition-adjusted grading probabilities
//! - The grade-or-not analysis
//! - Text recommendations from market scores

pub mod condition;
pub mod calculator;
pub mod grading;
pub mod recommendation;

pub use condition::CardCondition;
pub use calculator::{break_even, ProfitCalculator, Scenario, ScenarioInput};
pub use grading::{GradeOutlook, GradedPriceSource, GradingAnalysis, GradingAnalyzer, GradingVerdict};
pub use recommendation::{Band, MarketOutlook, Recommendation};
