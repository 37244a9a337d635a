//! Greedy peak-to-valley load shifting.
//!
//! Hours are ranked by score; the top quarter gives up a fixed fraction of its
//! load, which is spread evenly over the bottom quarter. Valley hours that
//! would exceed `max_load` are clamped and the excess is dropped rather than
//! redistributed, so the optimized schedule may hold less energy than the
//! baseline.

use tracing::debug;

use super::types::{Constraints, HourScore};
use crate::error::EngineError;

/// Share of the horizon placed in each of the peak and valley sets.
pub const PEAK_FRACTION: f64 = 0.25;

/// Shortest horizon accepted by [`shift_load`].
pub const MIN_HORIZON_HOURS: usize = 8;

/// Hours chosen to give and receive load, as indices into the horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Highest-scoring hours, best first.
    pub peaks: Vec<usize>,
    /// Lowest-scoring hours.
    pub valleys: Vec<usize>,
}

/// Result of one shifting pass.
#[derive(Debug, Clone)]
pub struct ShiftOutcome {
    /// Optimized load per hour (kW), every value in `[0, max_load]`.
    pub schedule: Vec<f64>,
    pub selection: Selection,
    /// Total load removed from peak hours (kW summed over hours).
    pub shifted_kw: f64,
    /// Load discarded by clamping to `max_load` (kW summed over hours).
    pub clamped_kw: f64,
}

/// Ranks hours by score and picks the top and bottom quarters.
///
/// Ranking is a stable descending sort, so equal scores keep ascending
/// index order and the selection is reproducible.
///
/// # Errors
///
/// Returns [`EngineError::HorizonTooShort`] for fewer than
/// [`MIN_HORIZON_HOURS`] hours.
pub fn select_peaks_and_valleys(scores: &[HourScore]) -> Result<Selection, EngineError> {
    let hours = scores.len();
    if hours < MIN_HORIZON_HOURS {
        return Err(EngineError::HorizonTooShort {
            hours,
            min: MIN_HORIZON_HOURS,
        });
    }

    let mut ranked: Vec<&HourScore> = scores.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let n = (hours as f64 * PEAK_FRACTION).floor() as usize;
    let peaks = ranked[..n].iter().map(|s| s.index).collect();
    let valleys = ranked[hours - n..].iter().map(|s| s.index).collect();

    Ok(Selection { peaks, valleys })
}

/// Moves a bounded fraction of peak load into valley hours.
///
/// # Errors
///
/// Propagates [`select_peaks_and_valleys`] errors.
pub fn shift_load(
    scores: &[HourScore],
    constraints: &Constraints,
) -> Result<ShiftOutcome, EngineError> {
    let selection = select_peaks_and_valleys(scores)?;
    let fraction = constraints.shiftable_fraction();
    let max_load = constraints.max_load;

    let mut schedule: Vec<f64> = scores.iter().map(|s| s.load).collect();

    let mut shifted_kw = 0.0;
    for &i in &selection.peaks {
        let removed = schedule[i] * fraction;
        schedule[i] -= removed;
        shifted_kw += removed;
    }

    let per_valley = shifted_kw / selection.valleys.len() as f64;
    let mut clamped_kw = 0.0;
    for &j in &selection.valleys {
        let new_load = schedule[j] + per_valley;
        if new_load > max_load {
            clamped_kw += new_load - max_load;
            schedule[j] = max_load;
        } else {
            schedule[j] = new_load;
        }
    }

    for load in &mut schedule {
        let bounded = load.clamp(0.0, max_load);
        if *load > max_load {
            clamped_kw += *load - max_load;
        }
        *load = bounded;
    }

    debug!(
        peaks = ?selection.peaks,
        valleys = ?selection.valleys,
        shifted_kw,
        clamped_kw,
        "shifted load"
    );

    Ok(ShiftOutcome {
        schedule,
        selection,
        shifted_kw,
        clamped_kw,
    })
}
