//! Linear price projection.
//!
//! A deterministic heuristic: fit price against days since the first dated
//! sale and extrapolate. Not a forecast model.

use cardvalue_core::{Error, ListingSet, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::debug;

use crate::stats::LinearFit;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Projected price with a 95% interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceProjection {
    pub projected_price: f64,
    pub lower: f64,
    pub upper: f64,
    pub r_squared: f64,
    /// R² discounted by price dispersion, within [0, 1].
    pub confidence: f64,
    pub days_ahead: i64,
    /// Dated sales used for the fit.
    pub sample_size: usize,
}

impl PriceProjection {
    /// Project `days_ahead` past the last dated sale.
    ///
    /// Returns `None` with fewer than `min_sales` dated listings or when all
    /// sales share one timestamp. `dispersion` is the coefficient of variation
    /// used to discount the confidence.
    pub fn project(
        listings: &ListingSet,
        days_ahead: i64,
        min_sales: usize,
        dispersion: f64,
    ) -> Option<Self> {
        match Self::try_project(listings, days_ahead, min_sales, dispersion) {
            Ok(projection) => Some(projection),
            Err(e) => {
                debug!(error = %e, "skipping price projection");
                None
            }
        }
    }

    /// Like [`PriceProjection::project`], reporting why no projection exists.
    pub fn try_project(
        listings: &ListingSet,
        days_ahead: i64,
        min_sales: usize,
        dispersion: f64,
    ) -> Result<Self> {
        let dated = listings.dated_prices();
        let required = min_sales.max(3);
        if dated.len() < required {
            return Err(Error::insufficient_data(format!(
                "{} dated sales, need {required}",
                dated.len()
            )));
        }

        let first = dated
            .iter()
            .map(|(date, _)| *date)
            .min()
            .ok_or_else(|| Error::insufficient_data("no dated sales"))?;
        let xs: Vec<f64> = dated
            .iter()
            .map(|(date, _)| (*date - first).num_seconds() as f64 / SECONDS_PER_DAY)
            .collect();
        let ys: Vec<f64> = dated.iter().map(|(_, price)| *price).collect();

        let fit = LinearFit::fit(&xs, &ys)
            .ok_or_else(|| Error::insufficient_data("all sales share one date"))?;
        let last_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let projected_price = fit.predict(last_x + days_ahead as f64);

        let t = StudentsT::new(0.0, 1.0, (fit.n - 2) as f64)
            .map_err(|e| Error::insufficient_data(format!("t distribution: {e}")))?
            .inverse_cdf(0.975);
        let half_width = t * fit.residual_std;

        Ok(Self {
            projected_price,
            lower: projected_price - half_width,
            upper: projected_price + half_width,
            r_squared: fit.r_squared,
            confidence: (fit.r_squared * (1.0 - dispersion)).clamp(0.0, 1.0),
            days_ahead,
            sample_size: fit.n,
        })
    }
}
