//! Historical time-series sources.
//!
//! A [`HistorySource`] answers one range query per run. Implementations may
//! return empty series; the [`DataProvider`](super::provider::DataProvider)
//! fills those with synthetic data.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::types::{SeriesBundle, TimeSeriesPoint};

/// Errors raised by history backends.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("history CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("history source unavailable: {0}")]
    Unavailable(String),
}

/// Range query over per-location load, price and carbon-intensity history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Returns every point with `start <= timestamp < end` for `location`,
    /// ordered by timestamp. Series without data are empty.
    async fn query_range(
        &self,
        location: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SeriesBundle, SourceError>;

    /// Backend name for logging.
    fn source_name(&self) -> &'static str;
}

/// Source with no history at all; every run is synthetic.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySource;

#[async_trait]
impl HistorySource for EmptySource {
    async fn query_range(
        &self,
        _location: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<SeriesBundle, SourceError> {
        Ok(SeriesBundle::default())
    }

    fn source_name(&self) -> &'static str {
        "empty"
    }
}

/// In-memory history keyed by location.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    series: HashMap<String, SeriesBundle>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the history of `location`.
    pub fn insert(&mut self, location: impl Into<String>, bundle: SeriesBundle) {
        self.series.insert(location.into(), bundle);
    }

    /// Number of locations with history.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

fn in_range(
    points: &[TimeSeriesPoint],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<TimeSeriesPoint> {
    let mut selected: Vec<TimeSeriesPoint> = points
        .iter()
        .filter(|p| p.timestamp >= start && p.timestamp < end)
        .copied()
        .collect();
    selected.sort_by_key(|p| p.timestamp);
    selected
}

#[async_trait]
impl HistorySource for MemorySource {
    async fn query_range(
        &self,
        location: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SeriesBundle, SourceError> {
        let Some(bundle) = self.series.get(location) else {
            return Ok(SeriesBundle::default());
        };
        Ok(SeriesBundle {
            load: in_range(&bundle.load, start, end),
            price: in_range(&bundle.price, start, end),
            carbon: in_range(&bundle.carbon, start, end),
        })
    }

    fn source_name(&self) -> &'static str {
        "memory"
    }
}

/// One row of a history CSV. Empty cells mean "no observation".
#[derive(Debug, Deserialize)]
struct HistoryRow {
    location: String,
    timestamp: DateTime<Utc>,
    load_kw: Option<f64>,
    price_per_kwh: Option<f64>,
    carbon_g_per_kwh: Option<f64>,
}

/// History loaded once from a CSV file.
///
/// Expected header:
/// `location,timestamp,load_kw,price_per_kwh,carbon_g_per_kwh`, with RFC 3339
/// timestamps.
#[derive(Debug, Clone)]
pub struct CsvSource {
    inner: MemorySource,
}

impl CsvSource {
    /// Reads history from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Csv`] if the file cannot be read or a row is malformed.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let reader = csv::Reader::from_path(path)?;
        let source = Self::from_csv(reader)?;
        info!(
            path = %path.display(),
            locations = source.inner.len(),
            "loaded history"
        );
        Ok(source)
    }

    /// Reads history from any CSV reader.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Csv`] if a row is malformed.
    pub fn from_reader(reader: impl Read) -> Result<Self, SourceError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, SourceError> {
        let mut series: HashMap<String, SeriesBundle> = HashMap::new();
        for row in reader.deserialize() {
            let row: HistoryRow = row?;
            let bundle = series.entry(row.location).or_default();
            if let Some(v) = row.load_kw {
                bundle.load.push(TimeSeriesPoint::new(row.timestamp, v));
            }
            if let Some(v) = row.price_per_kwh {
                bundle.price.push(TimeSeriesPoint::new(row.timestamp, v));
            }
            if let Some(v) = row.carbon_g_per_kwh {
                bundle.carbon.push(TimeSeriesPoint::new(row.timestamp, v));
            }
        }
        Ok(Self {
            inner: MemorySource { series },
        })
    }
}

#[async_trait]
impl HistorySource for CsvSource {
    async fn query_range(
        &self,
        location: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SeriesBundle, SourceError> {
        self.inner.query_range(location, start, end).await
    }

    fn source_name(&self) -> &'static str {
        "csv"
    }
}
