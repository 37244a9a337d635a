//! Hour-aligned input assembly with synthetic fallback.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use super::source::HistorySource;
use super::synthetic::{self, SyntheticLoad};
use super::types::{HourlyData, Provenance, SeriesBundle, SeriesOrigin, TimeSeriesPoint};

/// Fetches history for a horizon and fills whatever is missing.
///
/// [`DataProvider::fetch`] never fails: a source error or an empty series
/// degrades to synthetic data for that series only.
#[derive(Clone)]
pub struct DataProvider {
    source: Arc<dyn HistorySource>,
}

impl DataProvider {
    pub fn new(source: Arc<dyn HistorySource>) -> Self {
        Self { source }
    }

    /// Returns aligned load, price and carbon series of exactly `hours` entries
    /// starting at `start`.
    ///
    /// # Arguments
    ///
    /// * `location` - Key into the history source
    /// * `start` - First hour of the horizon
    /// * `hours` - Horizon length
    /// * `seed` - Seed for synthetic load noise; `None` draws one from the OS
    pub async fn fetch(
        &self,
        location: &str,
        start: DateTime<Utc>,
        hours: usize,
        seed: Option<u64>,
    ) -> HourlyData {
        let end = start + TimeDelta::hours(hours as i64);
        let bundle = match self.source.query_range(location, start, end).await {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(
                    location,
                    source = self.source.source_name(),
                    error = %e,
                    "history query failed, using synthetic data"
                );
                SeriesBundle::default()
            }
        };

        let timestamps: Vec<DateTime<Utc>> = (0..hours)
            .map(|i| start + TimeDelta::hours(i as i64))
            .collect();

        let mut synthetic_load = SyntheticLoad::new(seed);
        let (load, load_origin) =
            align(&bundle.load, start, &timestamps, |at| synthetic_load.load_kw(at));
        let (price, price_origin) =
            align(&bundle.price, start, &timestamps, synthetic::price_per_kwh);
        let (carbon, carbon_origin) =
            align(&bundle.carbon, start, &timestamps, synthetic::carbon_g_per_kwh);

        let provenance = Provenance {
            load: load_origin,
            price: price_origin,
            carbon: carbon_origin,
        };
        if provenance.is_fully_historical() {
            debug!(location, hours, "using historical data");
        } else {
            warn!(location, hours, ?provenance, "history incomplete, synthetic fill applied");
        }

        HourlyData {
            timestamps,
            load,
            price,
            carbon,
            provenance,
        }
    }
}

/// Buckets points into whole hours from `start` and fills empty buckets.
///
/// The first usable point landing in a bucket wins; points outside the
/// horizon are ignored. Non-finite values count as missing and negative
/// values are floored at 0, the same rule the synthetic load follows.
fn align(
    points: &[TimeSeriesPoint],
    start: DateTime<Utc>,
    timestamps: &[DateTime<Utc>],
    mut fill: impl FnMut(DateTime<Utc>) -> f64,
) -> (Vec<f64>, SeriesOrigin) {
    let hours = timestamps.len();
    let mut slots: Vec<Option<f64>> = vec![None; hours];

    for p in points {
        if !p.value.is_finite() {
            continue;
        }
        let offset = (p.timestamp - start).num_seconds();
        if offset < 0 {
            continue;
        }
        let bucket = (offset / 3600) as usize;
        if bucket < hours && slots[bucket].is_none() {
            slots[bucket] = Some(p.value.max(0.0));
        }
    }

    let filled = slots.iter().filter(|s| s.is_some()).count();
    let origin = if filled == hours {
        SeriesOrigin::Historical
    } else if filled == 0 {
        SeriesOrigin::Synthetic
    } else {
        SeriesOrigin::Partial
    };

    let values = slots
        .into_iter()
        .zip(timestamps)
        .map(|(slot, &at)| slot.unwrap_or_else(|| fill(at)))
        .collect();

    (values, origin)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::data::source::{EmptySource, MemorySource, SourceError};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
    }

    fn hourly(n: usize, value: f64) -> Vec<TimeSeriesPoint> {
        (0..n)
            .map(|i| TimeSeriesPoint::new(start() + TimeDelta::hours(i as i64), value))
            .collect()
    }

    struct FailingSource;

    #[async_trait]
    impl HistorySource for FailingSource {
        async fn query_range(
            &self,
            _location: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<SeriesBundle, SourceError> {
            Err(SourceError::Unavailable("connection refused".to_string()))
        }

        fn source_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn empty_history_is_fully_synthetic() {
        let provider = DataProvider::new(Arc::new(EmptySource));
        let data = provider.fetch("X", start(), 24, Some(1)).await;
        assert_eq!(data.hours(), 24);
        assert_eq!(data.load.len(), 24);
        assert_eq!(data.price.len(), 24);
        assert_eq!(data.carbon.len(), 24);
        assert_eq!(data.provenance.load, SeriesOrigin::Synthetic);
        assert_eq!(data.price[19], 0.18);
    }

    #[tokio::test]
    async fn only_missing_series_is_replaced() {
        let mut source = MemorySource::new();
        source.insert(
            "site",
            SeriesBundle {
                load: hourly(24, 123.0),
                ..SeriesBundle::default()
            },
        );
        let provider = DataProvider::new(Arc::new(source));
        let data = provider.fetch("site", start(), 24, Some(1)).await;
        assert!(data.load.iter().all(|&v| v == 123.0));
        assert_eq!(data.provenance.load, SeriesOrigin::Historical);
        assert_eq!(data.provenance.price, SeriesOrigin::Synthetic);
        assert_eq!(data.provenance.carbon, SeriesOrigin::Synthetic);
    }

    #[tokio::test]
    async fn gaps_are_filled_per_hour() {
        let mut points = hourly(24, 0.5);
        points.remove(3);
        let mut source = MemorySource::new();
        source.insert(
            "site",
            SeriesBundle {
                price: points,
                ..SeriesBundle::default()
            },
        );
        let provider = DataProvider::new(Arc::new(source));
        let data = provider.fetch("site", start(), 24, Some(1)).await;
        assert_eq!(data.provenance.price, SeriesOrigin::Partial);
        assert_eq!(data.price[2], 0.5);
        assert_eq!(data.price[3], synthetic::price_per_kwh(start() + TimeDelta::hours(3)));
    }

    #[tokio::test]
    async fn source_failure_degrades_to_synthetic() {
        let provider = DataProvider::new(Arc::new(FailingSource));
        let data = provider.fetch("site", start(), 168, Some(3)).await;
        assert_eq!(data.hours(), 168);
        assert_eq!(data.provenance.carbon, SeriesOrigin::Synthetic);
    }

    #[tokio::test]
    async fn seeded_synthetic_runs_repeat() {
        let provider = DataProvider::new(Arc::new(EmptySource));
        let a = provider.fetch("X", start(), 24, Some(42)).await;
        let b = provider.fetch("X", start(), 24, Some(42)).await;
        assert_eq!(a, b);
    }

    #[test]
    fn negative_history_is_floored_at_zero() {
        let ts: Vec<DateTime<Utc>> = (0..3).map(|i| start() + TimeDelta::hours(i)).collect();
        let points = vec![
            TimeSeriesPoint::new(start(), 200.0),
            TimeSeriesPoint::new(start() + TimeDelta::hours(1), -150.0),
            TimeSeriesPoint::new(start() + TimeDelta::hours(2), 80.0),
        ];
        let (values, origin) = align(&points, start(), &ts, |_| -1.0);
        assert_eq!(values, vec![200.0, 0.0, 80.0]);
        assert_eq!(origin, SeriesOrigin::Historical);
    }

    #[test]
    fn non_finite_history_is_treated_as_missing() {
        let ts: Vec<DateTime<Utc>> = (0..3).map(|i| start() + TimeDelta::hours(i)).collect();
        let points = vec![
            TimeSeriesPoint::new(start(), 10.0),
            TimeSeriesPoint::new(start() + TimeDelta::hours(1), f64::NAN),
            TimeSeriesPoint::new(start() + TimeDelta::hours(2), f64::INFINITY),
        ];
        let (values, origin) = align(&points, start(), &ts, |_| 7.0);
        assert_eq!(values, vec![10.0, 7.0, 7.0]);
        assert_eq!(origin, SeriesOrigin::Partial);
    }

    #[tokio::test]
    async fn bad_history_values_never_reach_the_series() {
        let mut load = hourly(24, 200.0);
        for p in &mut load[12..] {
            p.value = -150.0;
        }
        load[3].value = f64::NAN;
        let mut source = MemorySource::new();
        source.insert(
            "site",
            SeriesBundle {
                load,
                ..SeriesBundle::default()
            },
        );
        let provider = DataProvider::new(Arc::new(source));
        let data = provider.fetch("site", start(), 24, Some(1)).await;

        assert!(data.load.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert_eq!(data.load[3], SyntheticLoad::new(Some(1)).load_kw(start() + TimeDelta::hours(3)));
        assert_eq!(data.provenance.load, SeriesOrigin::Partial);
    }

    #[test]
    fn align_keeps_first_point_per_bucket() {
        let ts: Vec<DateTime<Utc>> = (0..2).map(|i| start() + TimeDelta::hours(i)).collect();
        let points = vec![
            TimeSeriesPoint::new(start(), 1.0),
            TimeSeriesPoint::new(start() + TimeDelta::minutes(30), 2.0),
            TimeSeriesPoint::new(start() + TimeDelta::hours(1), 3.0),
        ];
        let (values, origin) = align(&points, start(), &ts, |_| -1.0);
        assert_eq!(values, vec![1.0, 3.0]);
        assert_eq!(origin, SeriesOrigin::Historical);
    }
}
