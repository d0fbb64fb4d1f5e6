//! Descriptive market metrics.
//!
//! Computes:
//! - Price summary (avg / median / sample std / min / max)
//! - Trend ratio: recent window average vs. everything older
//! - Momentum: change in monthly-normalized OLS slope between the two windows
//! - 30- and 90-day sale volumes
//! - Graded-to-raw price multipliers

use cardvalue_core::config::{AggregateMode, MetricsConfig};
use cardvalue_core::{ratio_or_zero, GradeClass, ListingSet, MarketMetrics};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::stats::{mean, median, sample_std, LinearFit};
use crate::variations::most_common_variation;

const DAYS_PER_MONTH: f64 = 30.0;

/// Market metrics calculator.
#[derive(Debug, Clone, Default)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Headline metrics, honoring the configured aggregate mode.
    pub fn aggregate_at(&self, listings: &ListingSet, now: DateTime<Utc>) -> MarketMetrics {
        match self.config.aggregate {
            AggregateMode::AllVariations => self.calculate_at(listings, now),
            AggregateMode::MostCommonVariation => match most_common_variation(listings) {
                Some(variation) => {
                    debug!(%variation, "using most common variation as aggregate");
                    self.calculate_at(&listings.by_variation(variation), now)
                }
                None => self.calculate_at(listings, now),
            },
        }
    }

    /// Metrics over exactly the given listings.
    pub fn calculate_at(&self, listings: &ListingSet, now: DateTime<Utc>) -> MarketMetrics {
        if listings.is_empty() {
            return MarketMetrics::empty();
        }

        let prices = listings.prices();
        let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let window_start = days_before(now, self.config.trend_window_days);
        let dated = listings.dated_prices();
        let (recent, prior): (Vec<_>, Vec<_>) =
            dated.iter().copied().partition(|(date, _)| *date >= window_start);

        let recent_prices: Vec<f64> = recent.iter().map(|(_, p)| *p).collect();
        let prior_prices: Vec<f64> = prior.iter().map(|(_, p)| *p).collect();
        let recent_avg = mean(&recent_prices);
        let prior_avg = mean(&prior_prices);
        let trend_ratio = if recent.is_empty() || prior.is_empty() {
            0.0
        } else {
            ratio_or_zero(recent_avg - prior_avg, prior_avg)
        };

        let momentum = match (monthly_slope(&recent, now), monthly_slope(&prior, now)) {
            (Some(recent_slope), Some(prior_slope)) => recent_slope - prior_slope,
            _ => 0.0,
        };

        MarketMetrics {
            sale_count: listings.len(),
            avg_price: mean(&prices),
            median_price: median(&prices),
            std_price: sample_std(&prices),
            min_price,
            max_price,
            trend_ratio,
            recent_avg,
            prior_avg,
            momentum,
            volume_30d: count_since(&dated, days_before(now, 30)),
            volume_90d: count_since(&dated, days_before(now, 90)),
            psa9_multiplier: grade_multiplier(listings, GradeClass::Psa9),
            psa10_multiplier: grade_multiplier(listings, GradeClass::Psa10),
        }
    }
}

/// OLS slope of price over days, scaled to a month and divided by the window's
/// mean price. `None` when the window cannot support a fit.
fn monthly_slope(points: &[(DateTime<Utc>, f64)], now: DateTime<Utc>) -> Option<f64> {
    let xs: Vec<f64> = points
        .iter()
        .map(|(date, _)| -((now - *date).num_seconds() as f64) / 86_400.0)
        .collect();
    let ys: Vec<f64> = points.iter().map(|(_, p)| *p).collect();
    let fit = LinearFit::fit(&xs, &ys)?;
    let avg = mean(&ys);
    if avg > 0.0 {
        Some(fit.slope * DAYS_PER_MONTH / avg)
    } else {
        None
    }
}

/// `now` minus `days`, saturating at the earliest representable instant.
pub(crate) fn days_before(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn count_since(dated: &[(DateTime<Utc>, f64)], since: DateTime<Utc>) -> usize {
    dated.iter().filter(|(date, _)| *date >= since).count()
}

/// median(grade bucket) / median(raw bucket), absent when either is empty.
fn grade_multiplier(listings: &ListingSet, grade: GradeClass) -> Option<f64> {
    let raw = listings.by_grade(GradeClass::Raw).prices();
    let graded = listings.by_grade(grade).prices();
    if raw.is_empty() || graded.is_empty() {
        return None;
    }
    let raw_median = median(&raw);
    (raw_median > 0.0).then(|| median(&graded) / raw_median)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cardvalue_core::{Listing, Variation};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    fn make_listing(price: f64, days_ago: Option<i64>) -> Listing {
        Listing::new("card", price)
            .unwrap()
            .with_sale_date(days_ago.map(|d| now() - TimeDelta::days(d)))
    }

    #[test]
    fn test_empty_set_is_all_zero() {
        let metrics = MetricsCalculator::default().calculate_at(&ListingSet::default(), now());
        assert_eq!(metrics, MarketMetrics::empty());
        assert_eq!(metrics.sale_count, 0);
        assert!(metrics.psa10_multiplier.is_none());
    }

    #[test]
    fn test_single_listing() {
        let set = ListingSet::new(vec![make_listing(42.0, Some(3))]);
        let metrics = MetricsCalculator::default().calculate_at(&set, now());

        assert_eq!(metrics.sale_count, 1);
        assert_relative_eq!(metrics.avg_price, 42.0);
        assert_relative_eq!(metrics.median_price, 42.0);
        assert_relative_eq!(metrics.min_price, 42.0);
        assert_relative_eq!(metrics.max_price, 42.0);
        assert_eq!(metrics.std_price, 0.0);
        assert_eq!(metrics.trend_ratio, 0.0);
        assert_eq!(metrics.momentum, 0.0);
    }

    #[test]
    fn test_trend_ratio() {
        let set = ListingSet::new(vec![
            make_listing(12.0, Some(5)),
            make_listing(12.0, Some(10)),
            make_listing(10.0, Some(45)),
            make_listing(10.0, Some(60)),
            make_listing(11.0, None),
        ]);
        let metrics = MetricsCalculator::default().calculate_at(&set, now());

        assert_relative_eq!(metrics.recent_avg, 12.0);
        assert_relative_eq!(metrics.prior_avg, 10.0);
        assert_relative_eq!(metrics.trend_ratio, 0.2, epsilon = 1e-12);
        assert_eq!(metrics.volume_30d, 2);
        assert_eq!(metrics.volume_90d, 4);
        assert_eq!(metrics.sale_count, 5);
    }

    #[test]
    fn test_trend_needs_both_windows() {
        let set = ListingSet::new(vec![make_listing(12.0, Some(1)), make_listing(20.0, Some(2))]);
        let metrics = MetricsCalculator::default().calculate_at(&set, now());
        assert_eq!(metrics.trend_ratio, 0.0);
        assert_eq!(metrics.prior_avg, 0.0);
    }

    #[test]
    fn test_momentum_sign() {
        // Flat before the window, rising inside it.
        let set = ListingSet::new(vec![
            make_listing(10.0, Some(80)),
            make_listing(10.0, Some(60)),
            make_listing(10.0, Some(40)),
            make_listing(10.0, Some(25)),
            make_listing(12.0, Some(15)),
            make_listing(14.0, Some(5)),
        ]);
        let metrics = MetricsCalculator::default().calculate_at(&set, now());
        assert!(metrics.momentum > 0.0);
    }

    #[test]
    fn test_avg_and_median_within_range() {
        let set: ListingSet = [3.0, 9.0, 4.5, 100.0, 7.0]
            .iter()
            .map(|p| make_listing(*p, None))
            .collect();
        let m = MetricsCalculator::default().calculate_at(&set, now());
        assert!(m.avg_price >= m.min_price && m.avg_price <= m.max_price);
        assert!(m.median_price >= m.min_price && m.median_price <= m.max_price);
    }

    #[test]
    fn test_grade_multipliers() {
        let set = ListingSet::new(vec![
            make_listing(50.0, None),
            make_listing(50.0, None),
            make_listing(150.0, None).with_grade(GradeClass::Psa10),
        ]);
        let metrics = MetricsCalculator::default().calculate_at(&set, now());
        assert_relative_eq!(metrics.psa10_multiplier.unwrap(), 3.0);
        assert!(metrics.psa9_multiplier.is_none());
    }

    #[test]
    fn test_most_common_aggregate() {
        let set = ListingSet::new(vec![
            make_listing(10.0, None).with_variation(Some(Variation::Silver)),
            make_listing(12.0, None).with_variation(Some(Variation::Silver)),
            make_listing(100.0, None).with_variation(Some(Variation::Gold)),
            make_listing(5.0, None),
        ]);
        let all = MetricsCalculator::default().aggregate_at(&set, now());
        assert_eq!(all.sale_count, 4);

        let calc = MetricsCalculator::new(MetricsConfig {
            aggregate: AggregateMode::MostCommonVariation,
            ..Default::default()
        });
        let common = calc.aggregate_at(&set, now());
        assert_eq!(common.sale_count, 2);
        assert_relative_eq!(common.avg_price, 11.0);
    }

    #[test]
    fn test_most_common_falls_back_when_untagged() {
        let set = ListingSet::new(vec![make_listing(10.0, None), make_listing(20.0, None)]);
        let calc = MetricsCalculator::new(MetricsConfig {
            aggregate: AggregateMode::MostCommonVariation,
            ..Default::default()
        });
        assert_eq!(calc.aggregate_at(&set, now()).sale_count, 2);
    }

    #[test]
    fn test_oversized_window_saturates() {
        let calc = MetricsCalculator::new(MetricsConfig {
            trend_window_days: i64::MAX,
            ..MetricsConfig::default()
        });
        let set = ListingSet::new(vec![make_listing(12.0, Some(1)), make_listing(10.0, Some(400))]);
        let metrics = calc.calculate_at(&set, now());

        assert_relative_eq!(metrics.recent_avg, 11.0);
        assert_eq!(metrics.trend_ratio, 0.0);
        assert_eq!(days_before(now(), i64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
