//! Hour scoring: maps each hour to a scalar "cost to operate".

use super::types::{HourScore, Objective};

/// Price ($/kWh) that maps to 1.0 in the hybrid blend.
pub const HYBRID_PRICE_NORM: f64 = 0.20;
/// Carbon intensity (gCO₂/kWh) that maps to 1.0 in the hybrid blend.
pub const HYBRID_CARBON_NORM: f64 = 600.0;

/// Scores a single hour.
///
/// * `cost`: the price in $/kWh.
/// * `co2`: the carbon intensity in gCO₂/kWh.
/// * `hybrid`: `0.5 * price / 0.20 + 0.5 * carbon / 600`, dimensionless.
pub fn score(price: f64, carbon: f64, objective: Objective) -> f64 {
    match objective {
        Objective::Cost => price,
        Objective::Co2 => carbon,
        Objective::Hybrid => {
            0.5 * (price / HYBRID_PRICE_NORM) + 0.5 * (carbon / HYBRID_CARBON_NORM)
        }
    }
}

/// Scores every hour of an aligned horizon, preserving time order.
///
/// The three slices must have the same length; callers validate this.
pub fn score_hours(
    load: &[f64],
    price: &[f64],
    carbon: &[f64],
    objective: Objective,
) -> Vec<HourScore> {
    load.iter()
        .zip(price)
        .zip(carbon)
        .enumerate()
        .map(|(index, ((&load, &price), &carbon))| HourScore {
            index,
            score: score(price, carbon, objective),
            load,
        })
        .collect()
}
