//! Synthetic series used when real data is unavailable
//!
//! Everything produced here is tagged as simulated by the callers and is
//! never written into either cache tier.

use chrono::{Duration, NaiveDate};
use rand::Rng;
use serde::Serialize;

use crate::data::RatePoint;

/// Baseline for the history walk when no latest quote can be obtained
pub const DEFAULT_HISTORY_BASELINE: f64 = 1.0;

/// Baseline for mock forecasts when no latest quote can be obtained
pub const DEFAULT_FORECAST_BASELINE: f64 = 16500.0;

/// Length of the simulated history series, in days
pub const HISTORY_DAYS: i64 = 30;

/// Number of days a mock forecast reaches into the future
pub const FORECAST_DAYS: i64 = 7;

/// Maximum relative step between consecutive history points
const HISTORY_MAX_STEP: f64 = 0.01;

/// A simulated forecast point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: String,
    pub price: f64,
    pub confidence: &'static str,
}

/// Generates [`HISTORY_DAYS`] consecutive daily points ending on `end`.
///
/// The first point equals `baseline`; each following point moves from its
/// predecessor by a uniform perturbation of at most ±1%.
pub fn random_walk<R: Rng + ?Sized>(baseline: f64, end: NaiveDate, rng: &mut R) -> Vec<RatePoint> {
    let mut rate = baseline;
    (0..HISTORY_DAYS)
        .rev()
        .enumerate()
        .map(|(i, days_back)| {
            if i > 0 {
                rate *= 1.0 + rng.gen_range(-HISTORY_MAX_STEP..=HISTORY_MAX_STEP);
            }
            let date = end - Duration::days(days_back);
            RatePoint::new(date.format("%Y-%m-%d").to_string(), rate)
        })
        .collect()
}

/// Generates [`FORECAST_DAYS`] future points starting the day after `today`,
/// with a slight upward drift.
pub fn mock_forecast<R: Rng + ?Sized>(baseline: f64, today: NaiveDate, rng: &mut R) -> Vec<ForecastPoint> {
    let mut price = baseline;
    (1..=FORECAST_DAYS)
        .map(|day| {
            let noise = (rng.gen::<f64>() - 0.45) * 0.01;
            price *= 1.0 + noise;
            ForecastPoint {
                date: (today + Duration::days(day)).format("%Y-%m-%d").to_string(),
                price,
                confidence: "High (Mock)",
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_random_walk_starts_at_baseline() {
        let mut rng = StdRng::seed_from_u64(7);
        let series = random_walk(DEFAULT_HISTORY_BASELINE, today(), &mut rng);

        assert_eq!(series.len(), 30);
        assert_eq!(series[0].rate, DEFAULT_HISTORY_BASELINE);
    }

    #[test]
    fn test_random_walk_steps_stay_within_one_percent() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let series = random_walk(16400.0, today(), &mut rng);
            for pair in series.windows(2) {
                let change = (pair[1].rate / pair[0].rate - 1.0).abs();
                assert!(change <= 0.01 + 1e-12, "step of {} exceeds 1%", change);
            }
        }
    }

    #[test]
    fn test_random_walk_dates_are_consecutive_and_end_today() {
        let mut rng = StdRng::seed_from_u64(1);
        let series = random_walk(1.0, today(), &mut rng);

        assert_eq!(series.first().unwrap().date, "2026-09-20");
        assert_eq!(series.last().unwrap().date, "2026-10-19");
        for pair in series.windows(2) {
            let a = NaiveDate::parse_from_str(&pair[0].date, "%Y-%m-%d").unwrap();
            let b = NaiveDate::parse_from_str(&pair[1].date, "%Y-%m-%d").unwrap();
            assert_eq!(b - a, Duration::days(1));
        }
    }

    #[test]
    fn test_mock_forecast_covers_next_seven_days() {
        let mut rng = StdRng::seed_from_u64(3);
        let forecast = mock_forecast(DEFAULT_FORECAST_BASELINE, today(), &mut rng);

        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0].date, "2026-10-20");
        assert_eq!(forecast[6].date, "2026-10-26");
        assert!(forecast.iter().all(|p| p.confidence == "High (Mock)"));
        for p in &forecast {
            let drift = (p.price / DEFAULT_FORECAST_BASELINE - 1.0).abs();
            assert!(drift < 0.05, "forecast drifted {} from baseline", drift);
        }
    }
}
