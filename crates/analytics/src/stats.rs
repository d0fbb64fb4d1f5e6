//! Small statistics helpers over price slices.
//!
//! All helpers return 0.0 (or `None`) on inputs too small to estimate from,
//! so callers never see NaN.

use ordered_float::OrderedFloat;
use statrs::statistics::Statistics;

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Sample standard deviation (n - 1), 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let std = values.iter().std_dev();
    if std.is_finite() {
        std
    } else {
        0.0
    }
}

/// Copy and sort ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by_key(|v| OrderedFloat(*v));
    out
}

/// Linearly interpolated quantile of an ascending slice.
///
/// Uses the `(n - 1) * q` position, so q = 0.5 of an even-length slice is the
/// mean of the two middle values.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = (n - 1) as f64 * q.clamp(0.0, 1.0);
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Median, 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    quantile_sorted(&sorted(values), 0.5)
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination (1.0 when y is constant).
    pub r_squared: f64,
    /// Residual standard error with n - 2 degrees of freedom (0 for n = 2).
    pub residual_std: f64,
    pub n: usize,
}

impl LinearFit {
    /// Fit a line. `None` with fewer than two points or no spread in x.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return None;
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);
        let x_mean = mean(xs);
        let y_mean = mean(ys);

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - x_mean;
            let dy = y - y_mean;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }
        if sxx <= 0.0 {
            return None;
        }

        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let sse: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| {
                let residual = y - (intercept + slope * x);
                residual * residual
            })
            .sum();

        let r_squared = if syy > 0.0 { 1.0 - sse / syy } else { 1.0 };
        let residual_std = if n > 2 {
            (sse / (n - 2) as f64).sqrt()
        } else {
            0.0
        };

        Some(Self {
            slope,
            intercept,
            r_squared,
            residual_std,
            n,
        })
    }

    /// Fitted value at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}
