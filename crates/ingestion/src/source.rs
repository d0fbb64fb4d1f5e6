//! Listing source capability.
//!
//! The engine never talks to a marketplace itself. Whatever does (an HTTP
//! scraper, a cache, a replay file) implements [`ListingSource`] and hands
//! back a bounded, possibly empty list of raw records.

use std::time::Duration;

use cardvalue_core::{GradeClass, RawListing};
use serde::{Deserialize, Serialize};

/// Default upper bound on a single fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Parallel and finish keywords excluded from base-card searches.
const DEFAULT_EXCLUSIONS: &[&str] = &[
    "-reprint -fake -replica -custom",
    "-purple -blue -red -green -orange -pink -yellow -gold -silver -bronze",
    "-shock -velocity -hyper -prizm -mosaic -select -chrome -contenders",
    "-autograph -auto -patch -relic -memorabilia",
    "-wave -holo -refractor",
];

/// Something that can produce raw sold listings for a query.
///
/// Contract: `fetch_listings` returns within [`ListingSource::timeout`] and
/// reports every failure (network, parsing, rate limiting) as an empty list.
pub trait ListingSource {
    /// Upper bound on a single fetch.
    fn timeout(&self) -> Duration {
        DEFAULT_FETCH_TIMEOUT
    }

    /// Fetch raw listings for a query. Never fails; failure is an empty list.
    fn fetch_listings(&self, query: &ListingQuery) -> Vec<RawListing>;
}

/// Search parameters for one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingQuery {
    pub player_name: String,
    pub year: Option<String>,
    pub card_set: Option<String>,
    pub card_number: Option<String>,
    /// Requested parallel, matched as an exact phrase.
    pub variation: Option<String>,
    /// Which grade bucket to search: Raw, PSA 9 or PSA 10.
    pub scenario: GradeClass,
    pub negative_keywords: Vec<String>,
}

impl ListingQuery {
    /// Raw-card query for a player.
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            year: None,
            card_set: None,
            card_number: None,
            variation: None,
            scenario: GradeClass::Raw,
            negative_keywords: Vec::new(),
        }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_card_set(mut self, card_set: impl Into<String>) -> Self {
        self.card_set = Some(card_set.into());
        self
    }

    pub fn with_card_number(mut self, card_number: impl Into<String>) -> Self {
        self.card_number = Some(card_number.into());
        self
    }

    pub fn with_variation(mut self, variation: impl Into<String>) -> Self {
        self.variation = Some(variation.into());
        self
    }

    pub fn with_scenario(mut self, scenario: GradeClass) -> Self {
        self.scenario = scenario;
        self
    }

    /// Add comma-separated negative keywords.
    pub fn with_negative_keywords(mut self, keywords: &str) -> Self {
        self.negative_keywords.extend(
            keywords
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Render the marketplace search string.
    pub fn search_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        parts.extend(non_empty(&self.year));
        if !self.player_name.trim().is_empty() {
            parts.push(self.player_name.trim().to_string());
        }
        parts.extend(non_empty(&self.card_set));
        if let Some(number) = non_empty(&self.card_number) {
            if number.starts_with('#') {
                parts.push(number);
            } else {
                parts.push(format!("#{number}"));
            }
        }

        match self.scenario {
            GradeClass::Psa9 => parts.push("\"PSA 9\"".to_string()),
            GradeClass::Psa10 => parts.push("\"PSA 10\"".to_string()),
            GradeClass::Raw | GradeClass::OtherGraded => parts.push("-PSA -SGC -BGS".to_string()),
        }

        for keyword in &self.negative_keywords {
            parts.push(format!("-{keyword}"));
        }

        match non_empty(&self.variation) {
            Some(variation) => parts.push(format!("\"{variation}\"")),
            None => parts.extend(DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string())),
        }

        parts.join(" ")
    }
}

/// A fixed set of raw listings, e.g. replayed from a saved search.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    listings: Vec<RawListing>,
}

impl StaticSource {
    pub fn new(listings: Vec<RawListing>) -> Self {
        Self { listings }
    }
}

impl ListingSource for StaticSource {
    fn timeout(&self) -> Duration {
        Duration::ZERO
    }

    fn fetch_listings(&self, _query: &ListingQuery) -> Vec<RawListing> {
        self.listings.clone()
    }
}
