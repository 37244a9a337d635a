//! Request-level types: objective, horizon, constraints, and per-hour scores.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Quantity the optimizer is biased to reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Score hours by energy price.
    Cost,
    /// Score hours by grid carbon intensity.
    Co2,
    /// Score hours by a normalized 50/50 blend of price and carbon intensity.
    Hybrid,
}

impl Objective {
    /// Accepted names, in display order.
    pub const NAMES: &[&str] = &["cost", "co2", "hybrid"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Co2 => "co2",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cost" => Ok(Self::Cost),
            "co2" => Ok(Self::Co2),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(EngineError::InvalidObjective {
                value: s.to_string(),
            }),
        }
    }
}

/// Optimization window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeHorizon {
    /// One day, 24 hourly buckets.
    #[serde(rename = "24h")]
    Day,
    /// One week, 168 hourly buckets.
    #[serde(rename = "weekly")]
    Week,
}

impl TimeHorizon {
    /// Accepted names, in display order.
    pub const NAMES: &[&str] = &["24h", "weekly"];

    /// Number of hourly buckets in the window.
    pub fn hours(self) -> usize {
        match self {
            Self::Day => 24,
            Self::Week => 168,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "weekly",
        }
    }
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeHorizon {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Self::Day),
            "weekly" => Ok(Self::Week),
            _ => Err(EngineError::InvalidTimeHorizon {
                value: s.to_string(),
            }),
        }
    }
}

/// Operational constraints applied to the optimized schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Constraints {
    /// Upper bound on any optimized hour (kW).
    pub max_load: f64,
    /// Renewable share target (%). Advisory only: carried through to the run
    /// record, never read by the optimizer.
    pub renewable_target: f64,
    /// Enrolled in demand response; widens the shiftable fraction.
    pub demand_response: bool,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_load: 1000.0,
            renewable_target: 30.0,
            demand_response: true,
        }
    }
}

impl Constraints {
    /// Fraction of each peak hour's load moved to valleys.
    pub fn shiftable_fraction(&self) -> f64 {
        if self.demand_response { 0.20 } else { 0.10 }
    }

    /// Checks that the numeric fields are usable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConstraint`] naming the first bad field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.max_load.is_finite() || self.max_load < 0.0 {
            return Err(EngineError::InvalidConstraint {
                field: "maxLoad",
                message: format!("must be a finite number >= 0, got {}", self.max_load),
            });
        }
        if !self.renewable_target.is_finite() {
            return Err(EngineError::InvalidConstraint {
                field: "renewableTarget",
                message: format!("must be finite, got {}", self.renewable_target),
            });
        }
        Ok(())
    }
}

/// Objective-specific score for one hour of the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourScore {
    /// Position in the horizon (0-based, time order).
    pub index: usize,
    /// Higher means more expensive to operate under the chosen objective.
    pub score: f64,
    /// Baseline load for the hour (kW).
    pub load: f64,
}
