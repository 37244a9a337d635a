//! Time-series containers exchanged between the history source and the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of a quantity at a wall-clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Raw result of a history range query. Any series may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesBundle {
    /// Load observations (kW).
    pub load: Vec<TimeSeriesPoint>,
    /// Price observations ($/kWh).
    pub price: Vec<TimeSeriesPoint>,
    /// Carbon intensity observations (gCO₂/kWh).
    pub carbon: Vec<TimeSeriesPoint>,
}

/// Where the values of one aligned series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesOrigin {
    /// Every hour came from history.
    Historical,
    /// Some hours came from history, the gaps were synthesized.
    Partial,
    /// No history; every hour was synthesized.
    Synthetic,
}

/// Origin of each of the three aligned series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub load: SeriesOrigin,
    pub price: SeriesOrigin,
    pub carbon: SeriesOrigin,
}

impl Provenance {
    /// True when every value came from history, so the run is reproducible
    /// without a seed.
    pub fn is_fully_historical(&self) -> bool {
        [self.load, self.price, self.carbon]
            .iter()
            .all(|o| *o == SeriesOrigin::Historical)
    }
}

/// Hour-aligned inputs for one run.
///
/// All vectors have exactly `timestamps.len()` entries; index `i` in each
/// refers to the hour starting at `timestamps[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyData {
    pub timestamps: Vec<DateTime<Utc>>,
    /// Average load over the hour (kW).
    pub load: Vec<f64>,
    /// Energy price ($/kWh).
    pub price: Vec<f64>,
    /// Grid carbon intensity (gCO₂/kWh).
    pub carbon: Vec<f64>,
    pub provenance: Provenance,
}

impl HourlyData {
    pub fn hours(&self) -> usize {
        self.timestamps.len()
    }
}
