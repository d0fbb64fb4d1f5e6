//! Plain-text recommendations derived from market scores.

use cardvalue_core::{MarketMetrics, MarketScores};
use serde::Serialize;

/// Five-step band of a 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl Band {
    /// >=8 very high, >=6 high, >=4 moderate, >=2 low, else very low.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            Band::VeryHigh
        } else if score >= 6.0 {
            Band::High
        } else if score >= 4.0 {
            Band::Moderate
        } else if score >= 2.0 {
            Band::Low
        } else {
            Band::VeryLow
        }
    }
}

/// Market reading in words.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOutlook {
    pub health: Band,
    pub trend: Band,
    pub liquidity: Band,
}

impl MarketOutlook {
    /// Health follows the composite sentiment.
    pub fn from_scores(scores: &MarketScores) -> Self {
        Self {
            health: Band::from_score(scores.sentiment),
            trend: Band::from_score(scores.trend),
            liquidity: Band::from_score(scores.liquidity),
        }
    }

    pub fn health_text(&self) -> &'static str {
        match self.health {
            Band::VeryHigh => "very healthy and active",
            Band::High => "healthy",
            Band::Moderate => "moderately healthy",
            Band::Low => "showing some weakness",
            Band::VeryLow => "concerning",
        }
    }

    pub fn trend_text(&self) -> &'static str {
        match self.trend {
            Band::VeryHigh => "strongly upward",
            Band::High => "moderately upward",
            Band::Moderate => "stable",
            Band::Low => "showing some decline",
            Band::VeryLow => "declining significantly",
        }
    }

    pub fn liquidity_text(&self) -> &'static str {
        match self.liquidity {
            Band::VeryHigh => "highly liquid",
            Band::High => "reasonably liquid",
            Band::Moderate => "moderately liquid",
            Band::Low => "somewhat illiquid",
            Band::VeryLow => "illiquid",
        }
    }

    fn is_healthy(&self) -> bool {
        self.health >= Band::Moderate
    }

    fn is_rising(&self) -> bool {
        self.trend >= Band::High
    }

    fn is_liquid(&self) -> bool {
        self.liquidity >= Band::Moderate
    }

    /// Timing advice for a buyer.
    pub fn buyer_timing(&self) -> &'static str {
        if self.is_healthy() && self.is_rising() {
            "Consider buying soon, as prices show strength and could continue rising."
        } else if self.trend == Band::VeryLow && self.is_liquid() {
            "This could be a good buying opportunity if you believe in the long-term value."
        } else if self.trend == Band::Moderate {
            "The market is stable, making it a reasonable time to buy if the price meets your criteria."
        } else {
            "Exercise caution and consider waiting for more favorable market conditions."
        }
    }

    /// Timing advice for a seller.
    pub fn seller_timing(&self) -> &'static str {
        if self.is_rising() && self.is_liquid() {
            "Consider selling now to capitalize on strong market conditions."
        } else if self.trend == Band::VeryLow {
            "If you're looking to sell, you might want to act soon or be prepared to hold longer term."
        } else if self.trend == Band::Moderate && self.is_healthy() {
            "Current market conditions are favorable for selling if your price expectations are met."
        } else {
            "Consider holding unless you need to sell, as market conditions could improve."
        }
    }
}

/// One-line remark about a return on investment, in percent.
pub fn roi_remark(roi: f64) -> String {
    if roi > 20.0 {
        format!("The potential ROI of {roi:.1}% is notably strong.")
    } else if roi > 10.0 {
        format!("The potential ROI of {roi:.1}% is reasonable.")
    } else if roi > 0.0 {
        format!("The potential ROI of {roi:.1}% is modest.")
    } else {
        "The current price point may not offer favorable ROI.".to_string()
    }
}

/// Remark on skew between average and median, if it exceeds 10%.
pub fn skew_remark(metrics: &MarketMetrics) -> Option<&'static str> {
    if metrics.median_price <= 0.0 {
        return None;
    }
    let diff_pct = (metrics.avg_price - metrics.median_price) / metrics.median_price * 100.0;
    if diff_pct > 10.0 {
        Some("The market shows some high-value outlier listings, suggesting potential premium opportunities for rare variations.")
    } else if diff_pct < -10.0 {
        Some("There are some bargain listings available below the typical market price.")
    } else {
        None
    }
}

/// Buyer and seller recommendation paragraphs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub outlook: MarketOutlook,
    pub summary: String,
    pub buyer: String,
    pub seller: String,
}

impl Recommendation {
    /// Compose recommendations from an analysis and an optional scenario ROI.
    pub fn compose(metrics: &MarketMetrics, scores: &MarketScores, roi: Option<f64>) -> Self {
        let outlook = MarketOutlook::from_scores(scores);
        let insights: Vec<String> = skew_remark(metrics)
            .map(str::to_string)
            .into_iter()
            .chain(roi.map(roi_remark))
            .collect();
        let insights = insights.join(" ");

        let condition = format!(
            "The market is {} and {}.",
            outlook.health_text(),
            outlook.liquidity_text()
        );
        let summary = format!(
            "The market for this card is currently {}, with prices showing a {} trend. Trading activity indicates the market is {}.",
            outlook.health_text(),
            outlook.trend_text(),
            outlook.liquidity_text()
        );
        let paragraph = |role: &str, timing: &str| {
            let mut text = format!("{role}'s Recommendation: {timing} {condition}");
            if !insights.is_empty() {
                text.push(' ');
                text.push_str(&insights);
            }
            text
        };

        Self {
            buyer: paragraph("Buyer", outlook.buyer_timing()),
            seller: paragraph("Seller", outlook.seller_timing()),
            summary,
            outlook,
        }
    }
}
