//! Field extraction from scraped listing text.
//!
//! Each parser answers "present and valid" or "absent"; none of them coerce a
//! bad value into a default.

use std::sync::LazyLock;

use cardvalue_core::{Error, GradeClass, RawPrice, Result, Variation};
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use regex::Regex;

/// Separator between the bounds of a price range ("$10.00 to $12.00",
/// "$10-$12"). A bare dash only splits when the upper bound carries a symbol.
static PRICE_RANGE_SEP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:to|-|–)\s+|\s*[-–]\s*[$£€¥]").expect("valid regex")
});

/// An optional currency code, an optional symbol, then a number with optional
/// thousands separators.
static PRICE_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[A-Za-z]{1,3}\s*)?[$£€¥]?\s*(\d[\d,]*(?:\.\d+)?|\.\d+)\s*(?:[A-Za-z]{3})?\s*$")
        .expect("valid regex")
});

static RELATIVE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(d|days?|h|hrs?|hours?|m|mins?|minutes?)\s+ago\b")
        .expect("valid regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));

static ABSOLUTE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").expect("valid regex")
});

static GRADE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(psa|bgs|sgc|cgc|beckett)\s*(?:gem\s*(?:mint|mt)\s*)?(\d{1,2}(?:\.5)?)\b")
        .expect("valid regex")
});

static VARIATION_PATTERNS: LazyLock<Vec<(Variation, Regex)>> = LazyLock::new(|| {
    Variation::ALL
        .iter()
        .map(|&variation| {
            let words: Vec<String> = variation
                .keyword()
                .split_whitespace()
                .map(regex::escape)
                .collect();
            let pattern = format!(r"(?i)\b{}\b", words.join(r"\s+"));
            (variation, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

/// Parse a scraped price.
///
/// Strips currency symbols and thousands separators and takes the lower bound
/// of a range. Rejects anything that is not a finite positive number.
pub fn parse_price(raw: &RawPrice) -> Result<f64> {
    let value = match raw {
        RawPrice::Number(value) => *value,
        RawPrice::Text(text) => {
            let lower = PRICE_RANGE_SEP.split(text).next().unwrap_or_default();
            let caps = PRICE_TEXT
                .captures(lower)
                .ok_or_else(|| Error::parse(format!("unrecognized price text {text:?}")))?;
            caps[1]
                .replace(',', "")
                .parse::<f64>()
                .map_err(|e| Error::parse(format!("price {text:?}: {e}")))?
        }
    };

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::parse(format!("price must be positive, got {value}")))
    }
}

/// Parse a scraped sale date against `now`.
///
/// Accepts relative ("3d ago", "5 hours ago"), ISO ("2025-01-05") and absolute
/// ("Sold  Jan 5, 2025") forms. Dates in the future are clamped to `now`.
pub fn parse_sale_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let parsed = parse_relative(text, now)
        .or_else(|| parse_iso(text))
        .or_else(|| parse_absolute(text))?;
    Some(parsed.min(now))
}

fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RELATIVE_DATE.captures(text)?;
    let amount: i64 = caps[1].parse().ok()?;
    let unit = caps[2].to_ascii_lowercase();
    let delta = match unit.chars().next()? {
        'd' => TimeDelta::try_days(amount)?,
        'h' => TimeDelta::try_hours(amount)?,
        _ => TimeDelta::try_minutes(amount)?,
    };
    now.checked_sub_signed(delta)
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let caps = ISO_DATE.captures(text)?;
    let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    let caps = ABSOLUTE_DATE.captures(text)?;
    let normalized = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
    let date = NaiveDate::parse_from_str(&normalized, "%b %d %Y").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Detect the grading class from a title. No grading token means raw.
pub fn detect_grade(title: &str) -> GradeClass {
    let Some(caps) = GRADE_TOKEN.captures(title) else {
        return GradeClass::Raw;
    };
    let is_psa = caps[1].eq_ignore_ascii_case("psa");
    match (is_psa, &caps[2]) {
        (true, "9") => GradeClass::Psa9,
        (true, "10") => GradeClass::Psa10,
        _ => GradeClass::OtherGraded,
    }
}

/// First vocabulary keyword found in the title, in vocabulary order.
pub fn detect_variation(title: &str) -> Option<Variation> {
    VARIATION_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(title))
        .map(|(variation, _)| *variation)
}
