//! Core types and configuration for the card market valuation engine.
//!
//! This crate provides shared types used across all other crates:
//! - Listing types (raw scraped records, normalized listings, listing sets)
//! - Market outputs (metrics, scores, grades) and profit scenarios
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
