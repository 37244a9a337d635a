//! Scoring, load shifting, metrics, and run reporting.

pub mod engine;
/// Aggregate schedule metrics.
pub mod metrics;
pub mod report;
/// Per-hour objective scores.
pub mod scorer;
/// Greedy peak-to-valley load shifting.
pub mod shifter;
pub mod types;

pub use engine::{Engine, OptimizationRequest, plan};
pub use metrics::Metrics;
pub use report::{OptimizationResult, OptimizationRun, RunStatus, RunType, Savings};
pub use types::{Constraints, HourScore, Objective, TimeHorizon};
