//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use loadshift::data::{EmptySource, HistorySource, MemorySource, SeriesBundle, TimeSeriesPoint};
use loadshift::optimize::Engine;
use loadshift::store::MemoryStore;

/// Monday 2024-03-04 00:00 UTC.
pub fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

/// Engine over `source` with a fresh in-memory store.
pub fn engine_with(source: Arc<dyn HistorySource>) -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Engine::new(source, store.clone()), store)
}

/// Engine with no history, so every series is synthetic.
pub fn synthetic_engine() -> (Engine, Arc<MemoryStore>) {
    engine_with(Arc::new(EmptySource))
}

fn points(values: &[f64], start: DateTime<Utc>) -> Vec<TimeSeriesPoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| TimeSeriesPoint::new(start + TimeDelta::hours(i as i64), v))
        .collect()
}

/// History covering every hour of `load`, `price` and `carbon` from `start`.
pub fn history(
    location: &str,
    start: DateTime<Utc>,
    load: &[f64],
    price: &[f64],
    carbon: &[f64],
) -> Arc<MemorySource> {
    let mut source = MemorySource::new();
    source.insert(
        location,
        SeriesBundle {
            load: points(load, start),
            price: points(price, start),
            carbon: points(carbon, start),
        },
    );
    Arc::new(source)
}

/// Price: 0.18 in 7-9 and 17-21, 0.08 otherwise.
pub fn two_peak_prices() -> Vec<f64> {
    (0..24)
        .map(|h| if (7..=9).contains(&h) || (17..=21).contains(&h) { 0.18 } else { 0.08 })
        .collect()
}

/// Carbon: 600 in 17-21, 450 in 7-9, 400 otherwise.
pub fn evening_carbon() -> Vec<f64> {
    (0..24)
        .map(|h| match h {
            17..=21 => 600.0,
            7..=9 => 450.0,
            _ => 400.0,
        })
        .collect()
}
