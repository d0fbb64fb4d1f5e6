//! Core data types for the valuation engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lower bound of every dimension score.
pub const SCORE_MIN: f64 = 0.0;
/// Upper bound of every dimension score.
pub const SCORE_MAX: f64 = 10.0;
/// Score used when a dimension cannot be estimated.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Divide, resolving a zero (or non-finite) denominator to 0.0.
#[inline]
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Clamp a value into the [0, 10] score range. NaN maps to the neutral score.
#[inline]
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL_SCORE
    } else {
        value.clamp(SCORE_MIN, SCORE_MAX)
    }
}

// ============================================================================
// Raw input
// ============================================================================

/// Price field as delivered by the scraper: either text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Number(f64),
    Text(String),
}

impl From<f64> for RawPrice {
    fn from(value: f64) -> Self {
        RawPrice::Number(value)
    }
}

impl From<&str> for RawPrice {
    fn from(value: &str) -> Self {
        RawPrice::Text(value.to_string())
    }
}

impl From<String> for RawPrice {
    fn from(value: String) -> Self {
        RawPrice::Text(value)
    }
}

/// A scraped sold-listing record before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    /// Listing title text.
    #[serde(default)]
    pub title: String,
    /// Price text or number. Absent means the record is unusable.
    #[serde(default)]
    pub price: Option<RawPrice>,
    /// Sale date text ("Jan 5, 2025", "3d ago", "2025-01-05").
    #[serde(default)]
    pub date: Option<String>,
    /// Thumbnail URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl RawListing {
    /// Create a raw listing with a title and price.
    pub fn new(title: impl Into<String>, price: impl Into<RawPrice>) -> Self {
        Self {
            title: title.into(),
            price: Some(price.into()),
            date: None,
            image_url: None,
        }
    }

    /// Attach a sale date string.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Attach an image URL.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Parse a JSON array of raw listings.
    pub fn list_from_json(json: &str) -> Result<Vec<RawListing>> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Normalized listings
// ============================================================================

/// Grading class detected from a listing title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeClass {
    /// Ungraded card.
    Raw,
    /// PSA 9 slab.
    Psa9,
    /// PSA 10 slab.
    Psa10,
    /// Any other service/grade combination (PSA 8, BGS 9.5, SGC 10, ...).
    OtherGraded,
}

impl GradeClass {
    /// Human label matching marketplace wording.
    pub fn label(self) -> &'static str {
        match self {
            GradeClass::Raw => "Raw",
            GradeClass::Psa9 => "PSA 9",
            GradeClass::Psa10 => "PSA 10",
            GradeClass::OtherGraded => "Graded",
        }
    }

    /// Is this a slabbed card?
    pub fn is_graded(self) -> bool {
        !matches!(self, GradeClass::Raw)
    }
}

impl fmt::Display for GradeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Cosmetic/printing attribute from the fixed keyword vocabulary.
///
/// Declaration order is the match priority used by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variation {
    PressProof,
    Optic,
    Canvas,
    Negative,
    Refractor,
    Holo,
    Wave,
    Shock,
    Velocity,
    Hyper,
    Pink,
    Red,
    Blue,
    Yellow,
    Green,
    Purple,
    Orange,
    Gold,
    Silver,
    Bronze,
    Prizm,
    Mosaic,
    Select,
    Chrome,
    Contenders,
}

impl Variation {
    /// Every variation, in match priority order.
    pub const ALL: [Variation; 25] = [
        Variation::PressProof,
        Variation::Optic,
        Variation::Canvas,
        Variation::Negative,
        Variation::Refractor,
        Variation::Holo,
        Variation::Wave,
        Variation::Shock,
        Variation::Velocity,
        Variation::Hyper,
        Variation::Pink,
        Variation::Red,
        Variation::Blue,
        Variation::Yellow,
        Variation::Green,
        Variation::Purple,
        Variation::Orange,
        Variation::Gold,
        Variation::Silver,
        Variation::Bronze,
        Variation::Prizm,
        Variation::Mosaic,
        Variation::Select,
        Variation::Chrome,
        Variation::Contenders,
    ];

    /// Lowercase keyword as it appears in listing titles.
    pub fn keyword(self) -> &'static str {
        match self {
            Variation::PressProof => "press proof",
            Variation::Optic => "optic",
            Variation::Canvas => "canvas",
            Variation::Negative => "negative",
            Variation::Refractor => "refractor",
            Variation::Holo => "holo",
            Variation::Wave => "wave",
            Variation::Shock => "shock",
            Variation::Velocity => "velocity",
            Variation::Hyper => "hyper",
            Variation::Pink => "pink",
            Variation::Red => "red",
            Variation::Blue => "blue",
            Variation::Yellow => "yellow",
            Variation::Green => "green",
            Variation::Purple => "purple",
            Variation::Orange => "orange",
            Variation::Gold => "gold",
            Variation::Silver => "silver",
            Variation::Bronze => "bronze",
            Variation::Prizm => "prizm",
            Variation::Mosaic => "mosaic",
            Variation::Select => "select",
            Variation::Chrome => "chrome",
            Variation::Contenders => "contenders",
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A normalized sold listing.
///
/// Fields are private: a `Listing` can only be built through [`Listing::new`],
/// which refuses non-positive or non-finite prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    title: String,
    price: f64,
    sale_date: Option<DateTime<Utc>>,
    image_url: Option<String>,
    grade: GradeClass,
    variation: Option<Variation>,
}

impl Listing {
    /// Create a raw, undated, untagged listing.
    pub fn new(title: impl Into<String>, price: f64) -> Result<Self> {
        if !price.is_finite() || price <= 0.0 {
            return Err(Error::parse(format!("price must be positive, got {price}")));
        }
        Ok(Self {
            title: title.into(),
            price,
            sale_date: None,
            image_url: None,
            grade: GradeClass::Raw,
            variation: None,
        })
    }

    /// Set the sale date.
    pub fn with_sale_date(mut self, sale_date: Option<DateTime<Utc>>) -> Self {
        self.sale_date = sale_date;
        self
    }

    /// Set the image URL.
    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    /// Set the grade class.
    pub fn with_grade(mut self, grade: GradeClass) -> Self {
        self.grade = grade;
        self
    }

    /// Set the variation tag.
    pub fn with_variation(mut self, variation: Option<Variation>) -> Self {
        self.variation = variation;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn sale_date(&self) -> Option<DateTime<Utc>> {
        self.sale_date
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn grade(&self) -> GradeClass {
        self.grade
    }

    pub fn variation(&self) -> Option<Variation> {
        self.variation
    }
}

/// Ordered collection of listings from one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingSet {
    listings: Vec<Listing>,
}

impl ListingSet {
    /// Create a set, keeping the given order.
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listing> {
        self.listings.iter()
    }

    pub fn as_slice(&self) -> &[Listing] {
        &self.listings
    }

    /// All prices, in listing order.
    pub fn prices(&self) -> Vec<f64> {
        self.listings.iter().map(Listing::price).collect()
    }

    /// Listings carrying the given variation tag.
    pub fn by_variation(&self, variation: Variation) -> ListingSet {
        self.filter(|l| l.variation() == Some(variation))
    }

    /// Listings of the given grade class.
    pub fn by_grade(&self, grade: GradeClass) -> ListingSet {
        self.filter(|l| l.grade() == grade)
    }

    /// Listings matching a predicate.
    pub fn filter(&self, predicate: impl Fn(&Listing) -> bool) -> ListingSet {
        self.listings.iter().filter(|l| predicate(l)).cloned().collect()
    }

    /// (sale date, price) pairs for dated listings.
    pub fn dated_prices(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.listings
            .iter()
            .filter_map(|l| l.sale_date().map(|d| (d, l.price())))
            .collect()
    }

    pub fn into_vec(self) -> Vec<Listing> {
        self.listings
    }
}

impl From<Vec<Listing>> for ListingSet {
    fn from(listings: Vec<Listing>) -> Self {
        Self::new(listings)
    }
}

impl FromIterator<Listing> for ListingSet {
    fn from_iter<I: IntoIterator<Item = Listing>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ListingSet {
    type Item = &'a Listing;
    type IntoIter = std::slice::Iter<'a, Listing>;

    fn into_iter(self) -> Self::IntoIter {
        self.listings.iter()
    }
}

// ============================================================================
// Market outputs
// ============================================================================

/// Descriptive market statistics over a filtered listing set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMetrics {
    /// Number of listings the statistics cover.
    pub sale_count: usize,
    pub avg_price: f64,
    pub median_price: f64,
    /// Sample standard deviation (0 for fewer than two listings).
    pub std_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// (recent avg - prior avg) / prior avg.
    pub trend_ratio: f64,
    /// Average price inside the trend window (0 when empty).
    pub recent_avg: f64,
    /// Average price before the trend window (0 when empty).
    pub prior_avg: f64,
    /// Recent monthly slope minus prior monthly slope, both as fractions of price.
    pub momentum: f64,
    /// Sales in the last 30 days.
    pub volume_30d: usize,
    /// Sales in the last 90 days.
    pub volume_90d: usize,
    /// median(PSA 9) / median(Raw), absent when either bucket is empty.
    pub psa9_multiplier: Option<f64>,
    /// median(PSA 10) / median(Raw), absent when either bucket is empty.
    pub psa10_multiplier: Option<f64>,
}

impl MarketMetrics {
    /// All-zero metrics for an empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Coefficient of variation (std / avg), 0 when undefined.
    pub fn coefficient_of_variation(&self) -> f64 {
        ratio_or_zero(self.std_price, self.avg_price)
    }
}

/// Six 0-10 market dimensions plus the composite sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketScores {
    pub volatility: f64,
    pub trend: f64,
    pub liquidity: f64,
    pub momentum: f64,
    pub stability: f64,
    pub volume: f64,
    /// Weighted combination of the dimension scores.
    pub sentiment: f64,
}

impl MarketScores {
    /// Scores for an empty listing set. Sentiment is left at 0 for the score
    /// engine to weight.
    pub fn neutral() -> Self {
        Self {
            volatility: NEUTRAL_SCORE,
            trend: NEUTRAL_SCORE,
            liquidity: 0.0,
            momentum: NEUTRAL_SCORE,
            stability: NEUTRAL_SCORE,
            volume: 0.0,
            sentiment: 0.0,
        }
    }

    /// The six dimension scores, in declaration order.
    pub fn dimensions(&self) -> [f64; 6] {
        [
            self.volatility,
            self.trend,
            self.liquidity,
            self.momentum,
            self.stability,
            self.volume,
        ]
    }
}

/// Letter grade. Declaration order is best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
}

impl Letter {
    /// Map a 0-1 composite score to a letter: >=0.8 A, >=0.6 B, >=0.4 C, else D.
    pub fn from_composite(score: f64) -> Self {
        if score >= 0.8 {
            Letter::A
        } else if score >= 0.6 {
            Letter::B
        } else if score >= 0.4 {
            Letter::C
        } else {
            Letter::D
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Letter::A => "A",
            Letter::B => "B",
            Letter::C => "C",
            Letter::D => "D",
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buy/sell letter grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketGrade {
    pub buy_grade: Letter,
    pub sell_grade: Letter,
}

// ============================================================================
// Profit scenarios
// ============================================================================

/// Kind of profit scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioType {
    /// Sell the raw card now.
    ImmediateSale,
    /// Submit for grading, then sell.
    Grading,
}

/// Where a market price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Median of observed sales.
    Historical,
    /// Derived from a heuristic (multiplier or fallback).
    Estimated,
}

/// Coarse risk label attached to a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    pub fn description(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low - based on current market prices",
            RiskLevel::High => "High - depends on card condition and grading standards",
        }
    }
}

/// Result of a profit calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitScenario {
    pub scenario_type: ScenarioType,
    /// Target grade for grading scenarios.
    pub target_grade: Option<GradeClass>,
    /// Expected sale price (before probability weighting).
    pub market_price: f64,
    pub price_source: PriceSource,
    /// Sales the market price was derived from.
    pub sales_count: usize,
    pub purchase_price: f64,
    /// Purchase + shipping (+ grading fee).
    pub base_costs: f64,
    pub total_costs: f64,
    /// Marketplace fee charged on the sale.
    pub fee_amount: f64,
    /// Probability-weighted sale value (equals market price for immediate sales).
    pub expected_value: f64,
    pub net_profit: f64,
    /// Return on investment, percent.
    pub roi: f64,
    pub break_even_price: f64,
    /// Chance of achieving the target grade, 0-1 (grading only).
    pub success_probability: Option<f64>,
    /// Chance of landing below the target grade, 0-1 (grading only).
    pub lower_grade_probability: Option<f64>,
    /// Grading fee charged (grading only).
    pub grading_fee: Option<f64>,
    /// Grading turnaround in days (grading only).
    pub turnaround_days: Option<u32>,
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_listing_rejects_bad_price() {
        assert!(Listing::new("card", 0.0).is_err());
        assert!(Listing::new("card", -3.0).is_err());
        assert!(Listing::new("card", f64::NAN).is_err());
        assert!(Listing::new("card", f64::INFINITY).is_err());
        assert!(Listing::new("card", 0.01).is_ok());
    }

    #[test]
    fn test_listing_set_filters() {
        let set: ListingSet = vec![
            Listing::new("a", 10.0).unwrap().with_variation(Some(Variation::Silver)),
            Listing::new("b", 20.0).unwrap().with_grade(GradeClass::Psa10),
            Listing::new("c", 30.0).unwrap().with_variation(Some(Variation::Silver)),
        ]
        .into();

        assert_eq!(set.by_variation(Variation::Silver).len(), 2);
        assert_eq!(set.by_grade(GradeClass::Psa10).prices(), vec![20.0]);
        assert_eq!(set.by_grade(GradeClass::Raw).len(), 2);
        assert!(set.by_variation(Variation::Gold).is_empty());
    }

    #[test]
    fn test_dated_prices_skip_undated() {
        let date = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 0).unwrap();
        let set: ListingSet = vec![
            Listing::new("a", 10.0).unwrap().with_sale_date(Some(date)),
            Listing::new("b", 20.0).unwrap(),
        ]
        .into();
        assert_eq!(set.dated_prices(), vec![(date, 10.0)]);
    }

    #[test]
    fn test_letter_thresholds() {
        assert_eq!(Letter::from_composite(0.8), Letter::A);
        assert_eq!(Letter::from_composite(0.79), Letter::B);
        assert_eq!(Letter::from_composite(0.6), Letter::B);
        assert_eq!(Letter::from_composite(0.4), Letter::C);
        assert_eq!(Letter::from_composite(0.39), Letter::D);
        assert_eq!(Letter::from_composite(-1.0), Letter::D);
    }

    #[test]
    fn test_letter_monotonic() {
        let mut previous = Letter::D;
        for step in 0..=100 {
            let letter = Letter::from_composite(step as f64 / 100.0);
            assert!(letter <= previous);
            previous = letter;
        }
    }

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(5.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(5.0, f64::INFINITY), 0.0);
        assert!((ratio_or_zero(5.0, 2.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(42.0), 10.0);
        assert_eq!(clamp_score(f64::NAN), NEUTRAL_SCORE);
    }

    #[test]
    fn test_raw_listing_json() {
        let json = r#"[
            {"title": "2020 Prizm Herbert", "price": "$12.50", "date": "3d ago"},
            {"title": "2020 Prizm Herbert PSA 10", "price": 150.0, "image_url": "https://img/1.jpg"},
            {"title": "no price"}
        ]"#;
        let listings = RawListing::list_from_json(json).unwrap();
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].price, Some(RawPrice::Text("$12.50".into())));
        assert_eq!(listings[1].price, Some(RawPrice::Number(150.0)));
        assert!(listings[2].price.is_none());
    }

    #[test]
    fn test_neutral_scores_in_range() {
        for score in MarketScores::neutral().dimensions() {
            assert!((SCORE_MIN..=SCORE_MAX).contains(&score));
        }
    }
}
