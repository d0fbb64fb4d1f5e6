//! Listing ingestion and normalization for the valuation engine.
//!
//! This crate handles:
//! - Price, date, grade and variation extraction from scraped text
//! - Per-record normalization with drop-on-invalid semantics
//! - The listing-source capability that stands in for the scraper

pub mod parse;
pub mod normalizer;
pub mod source;

pub use normalizer::{ListingNormalizer, NormalizationStats};
pub use source::{ListingQuery, ListingSource, StaticSource};
