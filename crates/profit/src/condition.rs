//! Raw card condition and its effect on grading odds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seller-described condition of an ungraded card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCondition {
    NearMintMint,
    NearMint,
    ExcellentMint,
    Excellent,
    VeryGoodExcellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl CardCondition {
    /// Parse a condition label ("Near Mint-Mint", "near mint", "EX-MT", ...).
    pub fn parse(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "near-mint-mint" | "nm-mt" => Some(CardCondition::NearMintMint),
            "near-mint" | "nm" => Some(CardCondition::NearMint),
            "excellent-mint" | "ex-mt" => Some(CardCondition::ExcellentMint),
            "excellent" | "ex" => Some(CardCondition::Excellent),
            "very-good-excellent" | "vg-ex" => Some(CardCondition::VeryGoodExcellent),
            "very-good" | "vg" => Some(CardCondition::VeryGood),
            "good" => Some(CardCondition::Good),
            "fair" => Some(CardCondition::Fair),
            "poor" => Some(CardCondition::Poor),
            _ => None,
        }
    }

    /// Scale applied to the base grading probabilities.
    pub fn probability_multiplier(self) -> f64 {
        match self {
            CardCondition::NearMintMint => 1.4,
            CardCondition::NearMint => 1.2,
            CardCondition::ExcellentMint => 0.9,
            CardCondition::Excellent => 0.7,
            CardCondition::VeryGoodExcellent => 0.5,
            CardCondition::VeryGood => 0.3,
            CardCondition::Good => 0.2,
            CardCondition::Fair => 0.1,
            CardCondition::Poor => 0.05,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CardCondition::NearMintMint => "Near Mint-Mint",
            CardCondition::NearMint => "Near Mint",
            CardCondition::ExcellentMint => "Excellent-Mint",
            CardCondition::Excellent => "Excellent",
            CardCondition::VeryGoodExcellent => "Very Good-Excellent",
            CardCondition::VeryGood => "Very Good",
            CardCondition::Good => "Good",
            CardCondition::Fair => "Fair",
            CardCondition::Poor => "Poor",
        }
    }
}

impl fmt::Display for CardCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
