//! Before/after comparison, the persisted run record, and the caller-facing result.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::metrics::Metrics;
use super::types::{Constraints, Objective, TimeHorizon};
use crate::data::{HourlyData, Provenance};
use crate::error::EngineError;
use crate::store::RunStore;

/// Percentage that `delta` represents of `base`, or 0 when `base` is 0.
pub fn percent_of(delta: f64, base: f64) -> f64 {
    if base == 0.0 {
        return 0.0;
    }
    let pct = delta / base * 100.0;
    if pct.is_finite() { pct } else { 0.0 }
}

/// Baseline minus optimized, absolute and relative to baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Savings {
    /// $ saved.
    pub cost_savings: f64,
    pub cost_savings_percent: f64,
    /// kg CO₂ avoided.
    pub emissions_reduction: f64,
    pub emissions_reduction_percent: f64,
    /// kW removed from the highest hour.
    pub peak_reduction: f64,
    pub peak_reduction_percent: f64,
}

impl Savings {
    pub fn between(baseline: &Metrics, optimized: &Metrics) -> Self {
        let cost = baseline.total_cost - optimized.total_cost;
        let emissions = baseline.total_emissions - optimized.total_emissions;
        let peak = baseline.peak_load - optimized.peak_load;
        Self {
            cost_savings: cost,
            cost_savings_percent: percent_of(cost, baseline.total_cost),
            emissions_reduction: emissions,
            emissions_reduction_percent: percent_of(emissions, baseline.total_emissions),
            peak_reduction: peak,
            peak_reduction_percent: percent_of(peak, baseline.peak_load),
        }
    }
}

/// Label stored with each run record.
///
/// Old records carry `"milp"` even though no mixed-integer program was ever
/// solved; they are read as [`RunType::GreedyLoadShift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunType {
    #[serde(rename = "greedy_load_shift", alias = "milp")]
    GreedyLoadShift,
}

/// Outcome recorded with a run.
///
/// The engine only persists completed runs. `Failed` records can still be
/// present in a store written by other tools; they are listed in history
/// and left out of statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Inputs of a run, stored JSON-encoded in [`OptimizationRun::parameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunParameters {
    pub time_horizon: TimeHorizon,
    pub constraints: Constraints,
    pub location: String,
    pub hours: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            time_horizon: TimeHorizon::Day,
            constraints: Constraints::default(),
            location: "Unknown".to_string(),
            hours: TimeHorizon::Day.hours(),
            start_time: None,
            end_time: None,
            seed: None,
        }
    }
}

/// Persisted record of one run. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRun {
    pub created_at: DateTime<Utc>,
    pub run_type: RunType,
    pub objective_type: Objective,
    pub baseline_cost: f64,
    pub optimized_cost: f64,
    pub baseline_emissions: f64,
    pub optimized_emissions: f64,
    /// JSON-encoded [`RunParameters`].
    pub parameters: String,
    pub status: RunStatus,
}

impl OptimizationRun {
    /// Decodes [`Self::parameters`], falling back to defaults on malformed JSON.
    pub fn decoded_parameters(&self) -> RunParameters {
        serde_json::from_str(&self.parameters).unwrap_or_default()
    }
}

/// One schedule with its metrics, in result wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    /// Hourly load (kW).
    pub schedule: Vec<f64>,
    pub cost: f64,
    pub emissions: f64,
    pub peak_load: f64,
    pub renewable: f64,
}

impl ScheduleReport {
    fn new(schedule: Vec<f64>, metrics: &Metrics) -> Self {
        Self {
            schedule,
            cost: metrics.total_cost,
            emissions: metrics.total_emissions,
            peak_load: metrics.peak_load,
            renewable: metrics.renewable_percentage,
        }
    }
}

/// Result returned to the caller of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Milliseconds since the Unix epoch at creation.
    pub run_id: i64,
    pub objective: Objective,
    pub time_horizon: TimeHorizon,
    pub constraints: Constraints,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub baseline: ScheduleReport,
    pub optimized: ScheduleReport,
    pub savings: Savings,
    pub data_sources: Provenance,
    /// Aligned inputs the schedules were computed from.
    #[serde(skip)]
    pub inputs: HourlyData,
}

/// Everything the assembler needs from one run.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub created_at: DateTime<Utc>,
    pub objective: Objective,
    pub time_horizon: TimeHorizon,
    pub constraints: Constraints,
    pub location: String,
    pub seed: Option<u64>,
    pub data: HourlyData,
    /// Optimized hourly load (kW), aligned with `data`.
    pub optimized: Vec<f64>,
}

/// Run record and caller result built from the same metrics.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub run: OptimizationRun,
    pub result: OptimizationResult,
}

/// Computes metrics for both schedules, the savings, and the run record.
///
/// # Errors
///
/// Returns [`EngineError::SeriesLengthMismatch`] for misaligned inputs and
/// [`EngineError::Serialization`] if the parameters cannot be encoded.
pub fn assemble(input: ReportInput) -> Result<Assembled, EngineError> {
    let ReportInput {
        created_at,
        objective,
        time_horizon,
        constraints,
        location,
        seed,
        data,
        optimized,
    } = input;

    let baseline_metrics = Metrics::from_schedule(&data.load, &data.price, &data.carbon)?;
    let optimized_metrics = Metrics::from_schedule(&optimized, &data.price, &data.carbon)?;
    let savings = Savings::between(&baseline_metrics, &optimized_metrics);
    debug!(baseline = %baseline_metrics, optimized = %optimized_metrics, "metrics computed");

    let start_time = data.timestamps.first().copied().unwrap_or(created_at);
    let parameters = RunParameters {
        time_horizon,
        constraints,
        location: location.clone(),
        hours: data.hours(),
        start_time: Some(start_time),
        end_time: Some(start_time + TimeDelta::hours(data.hours() as i64)),
        seed,
    };

    let run = OptimizationRun {
        created_at,
        run_type: RunType::GreedyLoadShift,
        objective_type: objective,
        baseline_cost: baseline_metrics.total_cost,
        optimized_cost: optimized_metrics.total_cost,
        baseline_emissions: baseline_metrics.total_emissions,
        optimized_emissions: optimized_metrics.total_emissions,
        parameters: serde_json::to_string(&parameters)?,
        status: RunStatus::Completed,
    };

    let result = OptimizationResult {
        run_id: created_at.timestamp_millis(),
        objective,
        time_horizon,
        constraints,
        location,
        start_time,
        baseline: ScheduleReport::new(data.load.clone(), &baseline_metrics),
        optimized: ScheduleReport::new(optimized, &optimized_metrics),
        savings,
        data_sources: data.provenance,
        inputs: data,
    };

    Ok(Assembled { run, result })
}

/// Persists the run record and hands back the result.
///
/// # Errors
///
/// Store failures propagate unchanged as [`EngineError::Store`].
pub async fn publish(
    store: &dyn RunStore,
    assembled: Assembled,
) -> Result<OptimizationResult, EngineError> {
    let Assembled { run, result } = assembled;
    store.create(&run).await?;
    info!(
        run_id = result.run_id,
        backend = store.backend_name(),
        "run recorded"
    );
    Ok(result)
}
