//! Aggregate cost, emissions, peak and renewable share for one schedule.
//!
//! Every schedule entry is the average load (kW) over a one-hour bucket, so
//! `load * price` is directly the dollar cost of that hour and
//! `load * carbon` is grams of CO₂ for that hour. There is no separate
//! duration factor; changing the bucket size would change every total here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Hours whose carbon intensity is below this count as renewable (gCO₂/kWh).
pub const RENEWABLE_CARBON_THRESHOLD: f64 = 300.0;

/// Derived schedule metrics. Computed once, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Sum of `load * price` over the horizon ($).
    pub total_cost: f64,
    /// Sum of `load * carbon / 1000` over the horizon (kg CO₂).
    pub total_emissions: f64,
    /// Highest hourly load (kW).
    pub peak_load: f64,
    /// Share of load falling in low-carbon hours (%, 0–100).
    pub renewable_percentage: f64,
}

impl Metrics {
    /// Computes metrics from a schedule and its aligned price and carbon series.
    ///
    /// # Arguments
    ///
    /// * `load` - Hourly average load (kW)
    /// * `price` - Hourly price ($/kWh)
    /// * `carbon` - Hourly carbon intensity (gCO₂/kWh)
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SeriesLengthMismatch`] if the slices differ in length.
    pub fn from_schedule(load: &[f64], price: &[f64], carbon: &[f64]) -> Result<Self, EngineError> {
        if load.len() != price.len() || load.len() != carbon.len() {
            return Err(EngineError::SeriesLengthMismatch {
                load: load.len(),
                price: price.len(),
                carbon: carbon.len(),
            });
        }

        let mut total_cost = 0.0;
        let mut total_emissions = 0.0;
        let mut peak_load = 0.0_f64;
        let mut total_load = 0.0;
        let mut renewable_load = 0.0;

        for ((&kw, &p), &c) in load.iter().zip(price).zip(carbon) {
            total_cost += kw * p;
            total_emissions += kw * c / 1000.0;
            peak_load = peak_load.max(kw);
            total_load += kw;
            if c < RENEWABLE_CARBON_THRESHOLD {
                renewable_load += kw;
            }
        }

        let renewable_percentage = if total_load > 0.0 {
            renewable_load / total_load * 100.0
        } else {
            0.0
        };

        Ok(Self {
            total_cost,
            total_emissions,
            peak_load,
            renewable_percentage,
        })
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cost=${:.2}  emissions={:.2} kg  peak={:.2} kW  renewable={:.1}%",
            self.total_cost, self.total_emissions, self.peak_load, self.renewable_percentage
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cost_and_emissions_use_one_hour_buckets() {
        let m = Metrics::from_schedule(&[100.0, 200.0], &[0.10, 0.20], &[400.0, 500.0]).unwrap();
        assert_relative_eq!(m.total_cost, 50.0);
        // (100 * 400 + 200 * 500) / 1000
        assert_relative_eq!(m.total_emissions, 140.0);
        assert_eq!(m.peak_load, 200.0);
    }

    #[test]
    fn renewable_share_counts_strictly_low_carbon_hours() {
        let m = Metrics::from_schedule(
            &[100.0, 100.0, 200.0],
            &[0.1, 0.1, 0.1],
            &[250.0, 300.0, 400.0],
        )
        .unwrap();
        assert_relative_eq!(m.renewable_percentage, 25.0);
    }

    #[test]
    fn zero_load_gives_zero_share() {
        let m = Metrics::from_schedule(&[0.0; 4], &[0.1; 4], &[100.0; 4]).unwrap();
        assert_eq!(m.renewable_percentage, 0.0);
        assert_eq!(m.peak_load, 0.0);
    }

    #[test]
    fn empty_schedule_is_all_zero() {
        let m = Metrics::from_schedule(&[], &[], &[]).unwrap();
        assert_eq!(m.total_cost, 0.0);
        assert_eq!(m.total_emissions, 0.0);
        assert_eq!(m.peak_load, 0.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = Metrics::from_schedule(&[1.0, 2.0], &[0.1], &[100.0, 100.0]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::SeriesLengthMismatch {
                load: 2,
                price: 1,
                carbon: 2
            }
        ));
    }
}
