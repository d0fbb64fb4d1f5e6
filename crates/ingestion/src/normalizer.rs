//! Raw listing normalization.
//!
//! Turns scraped records into typed [`Listing`]s. A record without a usable
//! price is dropped; every other field degrades to "absent" on its own.

use cardvalue_core::{Error, Listing, ListingSet, RawListing, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::parse::{detect_grade, detect_variation, parse_price, parse_sale_date};

/// Statistics about normalization quality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// Records seen.
    pub total_records: u64,
    /// Records turned into listings.
    pub accepted: u64,
    /// Records dropped because the price field was absent.
    pub missing_price: u64,
    /// Records dropped because the price did not parse or was not positive.
    pub invalid_price: u64,
    /// Accepted listings without a usable sale date.
    pub undated: u64,
    /// Accepted listings carrying a grading token.
    pub graded: u64,
    /// Accepted listings carrying a variation tag.
    pub tagged: u64,
}

impl NormalizationStats {
    /// Records dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.missing_price + self.invalid_price
    }

    /// Fraction of records accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_records > 0 {
            self.accepted as f64 / self.total_records as f64
        } else {
            0.0
        }
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Listing normalizer.
#[derive(Debug, Default)]
pub struct ListingNormalizer {
    stats: NormalizationStats,
}

impl ListingNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one record, resolving relative dates against `now`.
    pub fn normalize_at(&mut self, raw: &RawListing, now: DateTime<Utc>) -> Result<Listing> {
        self.stats.total_records += 1;

        let Some(raw_price) = raw.price.as_ref() else {
            self.stats.missing_price += 1;
            return Err(Error::parse(format!("missing price for {:?}", raw.title)));
        };

        let price = match parse_price(raw_price) {
            Ok(price) => price,
            Err(e) => {
                self.stats.invalid_price += 1;
                return Err(e);
            }
        };

        let title = raw.title.trim();
        let sale_date = raw.date.as_deref().and_then(|d| parse_sale_date(d, now));
        let image_url = raw
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        let grade = detect_grade(title);
        let variation = detect_variation(title);

        let listing = Listing::new(title, price)?
            .with_sale_date(sale_date)
            .with_image_url(image_url)
            .with_grade(grade)
            .with_variation(variation);

        self.stats.accepted += 1;
        if sale_date.is_none() {
            self.stats.undated += 1;
        }
        if grade.is_graded() {
            self.stats.graded += 1;
        }
        if variation.is_some() {
            self.stats.tagged += 1;
        }

        Ok(listing)
    }

    /// Normalize a batch against `now`, dropping records that fail.
    pub fn normalize_batch_at(&mut self, raws: &[RawListing], now: DateTime<Utc>) -> ListingSet {
        let mut listings = Vec::with_capacity(raws.len());
        for raw in raws {
            match self.normalize_at(raw, now) {
                Ok(listing) => listings.push(listing),
                Err(e) => debug!(title = %raw.title, error = %e, "dropping listing"),
            }
        }

        debug!(
            accepted = self.stats.accepted,
            dropped = self.stats.dropped(),
            undated = self.stats.undated,
            "normalized listing batch"
        );

        ListingSet::new(listings)
    }

    /// Normalize a batch against the current time.
    pub fn normalize_batch(&mut self, raws: &[RawListing]) -> ListingSet {
        self.normalize_batch_at(raws, Utc::now())
    }

    /// Get normalization statistics.
    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardvalue_core::{GradeClass, RawPrice, Variation};
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_normalize_full_record() {
        let mut normalizer = ListingNormalizer::new();
        let raw = RawListing::new("  2020 Prizm Herbert Silver PSA 10 ", "$150.00")
            .with_date("2d ago")
            .with_image_url("https://i.example/1.jpg");

        let listing = normalizer.normalize_at(&raw, now()).unwrap();

        assert_eq!(listing.title(), "2020 Prizm Herbert Silver PSA 10");
        assert!((listing.price() - 150.0).abs() < 1e-10);
        assert_eq!(listing.sale_date(), Some(now() - TimeDelta::days(2)));
        assert_eq!(listing.grade(), GradeClass::Psa10);
        assert_eq!(listing.variation(), Some(Variation::Silver));
        assert_eq!(listing.image_url(), Some("https://i.example/1.jpg"));
    }

    #[test]
    fn test_bad_price_dropped_not_zeroed() {
        let mut normalizer = ListingNormalizer::new();
        let raws = vec![
            RawListing::new("good", "$10"),
            RawListing::new("free", "$0"),
            RawListing::new("words", "make an offer"),
            RawListing {
                title: "missing".into(),
                ..Default::default()
            },
            RawListing::new("numeric", RawPrice::Number(12.0)),
        ];

        let set = normalizer.normalize_batch_at(&raws, now());

        assert_eq!(set.prices(), vec![10.0, 12.0]);
        let stats = normalizer.stats();
        assert_eq!(stats.total_records, 5);
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.invalid_price, 2);
        assert_eq!(stats.missing_price, 1);
        assert_eq!(stats.dropped(), 3);
    }

    #[test]
    fn test_unparsable_date_keeps_listing() {
        let mut normalizer = ListingNormalizer::new();
        let raws = vec![RawListing::new("card", "$5").with_date("sometime last week")];

        let set = normalizer.normalize_batch_at(&raws, now());

        assert_eq!(set.len(), 1);
        assert!(set.as_slice()[0].sale_date().is_none());
        assert_eq!(normalizer.stats().undated, 1);
    }

    #[test]
    fn test_empty_batch() {
        let mut normalizer = ListingNormalizer::new();
        let set = normalizer.normalize_batch_at(&[], now());
        assert!(set.is_empty());
        assert_eq!(normalizer.stats().acceptance_rate(), 0.0);
    }

    #[test]
    fn test_blank_image_url_is_absent() {
        let mut normalizer = ListingNormalizer::new();
        let raw = RawListing::new("card", "$5").with_image_url("   ");
        let listing = normalizer.normalize_at(&raw, now()).unwrap();
        assert!(listing.image_url().is_none());
    }

    #[test]
    fn test_reset_stats() {
        let mut normalizer = ListingNormalizer::new();
        normalizer.normalize_batch_at(&[RawListing::new("card", "$5")], now());
        assert_eq!(normalizer.stats().accepted, 1);
        normalizer.reset_stats();
        assert_eq!(normalizer.stats(), &NormalizationStats::default());
    }

    #[test]
    fn test_scraped_json_batch() {
        let raws: Vec<RawListing> = serde_json::from_str(
            r#"[
                {"title": "2020 Prizm Herbert PSA 10", "price": "$1,250.00", "date": "Jan 5, 2025"},
                {"title": "2020 Prizm Herbert", "price": 42.5},
                {"title": "no price"}
            ]"#,
        )
        .unwrap();
        let mut normalizer = ListingNormalizer::new();
        let set = normalizer.normalize_batch_at(&raws, now());

        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].grade(), GradeClass::Psa10);
        assert_eq!(set.as_slice()[1].price(), 42.5);
        assert_eq!(normalizer.stats().missing_price, 1);
    }
}
