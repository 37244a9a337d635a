//! Error types surfaced by the optimization engine.

use crate::store::StoreError;

/// Errors returned by [`Engine::run`](crate::optimize::engine::Engine::run) and
/// the pure optimization stages.
///
/// Validation variants are produced before any data is fetched. Missing
/// historical data is never an error: it degrades to synthetic series.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Objective name outside the accepted set.
    #[error("invalid objective \"{value}\", expected one of: cost, co2, hybrid")]
    InvalidObjective { value: String },

    /// Time horizon name outside the accepted set.
    #[error("invalid time horizon \"{value}\", expected one of: 24h, weekly")]
    InvalidTimeHorizon { value: String },

    /// A constraint value that cannot be used for optimization.
    #[error("invalid constraint {field}: {message}")]
    InvalidConstraint { field: &'static str, message: String },

    /// Too few hours for disjoint peak and valley sets.
    #[error("horizon of {hours} hours is too short, at least {min} hours are required")]
    HorizonTooShort { hours: usize, min: usize },

    /// Schedule, price and carbon arrays are not index-aligned.
    #[error(
        "series length mismatch: load has {load} points, price has {price}, carbon has {carbon}"
    )]
    SeriesLengthMismatch {
        load: usize,
        price: usize,
        carbon: usize,
    },

    /// Persisting the run record failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Encoding the run parameters failed.
    #[error("failed to encode run parameters: {0}")]
    Serialization(#[from] serde_json::Error),
}
