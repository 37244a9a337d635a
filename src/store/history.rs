//! Run history listings and aggregate statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{HistoryQuery, RunStore, StoreError, StoredRun};
use crate::optimize::report::{RunParameters, RunStatus, RunType, percent_of};
use crate::optimize::types::Objective;

/// A stored run with its savings worked out and parameters decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub run_type: RunType,
    pub objective_type: Objective,
    pub status: RunStatus,
    pub baseline_cost: f64,
    pub optimized_cost: f64,
    pub cost_savings: f64,
    pub cost_savings_percent: f64,
    pub baseline_emissions: f64,
    pub optimized_emissions: f64,
    pub emissions_reduction: f64,
    pub emissions_reduction_percent: f64,
    pub parameters: RunParameters,
}

impl From<StoredRun> for RunSummary {
    fn from(stored: StoredRun) -> Self {
        let StoredRun { id, run } = stored;
        let parameters = run.decoded_parameters();
        let cost_savings = run.baseline_cost - run.optimized_cost;
        let emissions_reduction = run.baseline_emissions - run.optimized_emissions;
        Self {
            id,
            created_at: run.created_at,
            run_type: run.run_type,
            objective_type: run.objective_type,
            status: run.status,
            baseline_cost: run.baseline_cost,
            optimized_cost: run.optimized_cost,
            cost_savings,
            cost_savings_percent: percent_of(cost_savings, run.baseline_cost),
            baseline_emissions: run.baseline_emissions,
            optimized_emissions: run.optimized_emissions,
            emissions_reduction,
            emissions_reduction_percent: percent_of(emissions_reduction, run.baseline_emissions),
            parameters,
        }
    }
}

/// Per-objective aggregate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveStats {
    pub count: usize,
    pub average_cost_savings: f64,
    pub average_emissions_reduction: f64,
}

/// Aggregates over completed runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub total_runs: usize,
    /// $ saved across all completed runs.
    pub total_cost_savings: f64,
    /// kg CO₂ avoided across all completed runs.
    pub total_emissions_reduction: f64,
    /// Keyed by objective name.
    pub by_objective: BTreeMap<String, ObjectiveStats>,
}

impl RunStats {
    /// Folds the completed runs among `runs`; failed runs are ignored.
    pub fn from_runs<'a>(runs: impl IntoIterator<Item = &'a StoredRun>) -> Self {
        let mut stats = Self::default();
        let mut sums: BTreeMap<String, (usize, f64, f64)> = BTreeMap::new();

        for stored in runs {
            let run = &stored.run;
            if run.status != RunStatus::Completed {
                continue;
            }
            let cost = run.baseline_cost - run.optimized_cost;
            let emissions = run.baseline_emissions - run.optimized_emissions;
            stats.total_runs += 1;
            stats.total_cost_savings += cost;
            stats.total_emissions_reduction += emissions;

            let entry = sums
                .entry(run.objective_type.as_str().to_string())
                .or_default();
            entry.0 += 1;
            entry.1 += cost;
            entry.2 += emissions;
        }

        stats.by_objective = sums
            .into_iter()
            .map(|(name, (count, cost, emissions))| {
                let n = count as f64;
                (
                    name,
                    ObjectiveStats {
                        count,
                        average_cost_savings: cost / n,
                        average_emissions_reduction: emissions / n,
                    },
                )
            })
            .collect();
        stats
    }
}

/// Lists summaries of the runs matching `query`, most recent first.
pub async fn history(
    store: &dyn RunStore,
    query: &HistoryQuery,
) -> Result<Vec<RunSummary>, StoreError> {
    let runs = store.list(query).await?;
    Ok(runs.into_iter().map(RunSummary::from).collect())
}

/// Aggregates every completed run in `store`.
pub async fn stats(store: &dyn RunStore) -> Result<RunStats, StoreError> {
    let runs = store.list(&HistoryQuery::all()).await?;
    Ok(RunStats::from_runs(&runs))
}
