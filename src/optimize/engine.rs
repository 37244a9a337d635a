//! End-to-end run: fetch, score, shift, measure, record.

use std::sync::Arc;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use tracing::{info, instrument};

use super::report::{self, OptimizationResult, ReportInput};
use super::scorer::score_hours;
use super::shifter::{MIN_HORIZON_HOURS, ShiftOutcome, shift_load};
use super::types::{Constraints, Objective, TimeHorizon};
use crate::data::{DataProvider, HistorySource};
use crate::error::EngineError;
use crate::store::RunStore;

/// Caller inputs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRequest {
    pub objective: Objective,
    pub time_horizon: TimeHorizon,
    pub constraints: Constraints,
    /// Key into the history source.
    pub location: String,
    /// First hour of the horizon, truncated to the hour; defaults to the current hour.
    pub start_time: Option<DateTime<Utc>>,
    /// Seed for synthetic load noise; overrides the engine default.
    pub seed: Option<u64>,
}

impl OptimizationRequest {
    pub fn new(objective: Objective, time_horizon: TimeHorizon, location: impl Into<String>) -> Self {
        Self {
            objective,
            time_horizon,
            constraints: Constraints::default(),
            location: location.into(),
            start_time: None,
            seed: None,
        }
    }

    /// Builds a request from wire names.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidObjective`] or
    /// [`EngineError::InvalidTimeHorizon`] naming the rejected value.
    pub fn parse(
        objective: &str,
        time_horizon: &str,
        location: impl Into<String>,
    ) -> Result<Self, EngineError> {
        Ok(Self::new(objective.parse()?, time_horizon.parse()?, location))
    }

    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Scores the hours and shifts load. Pure and deterministic.
///
/// # Errors
///
/// Returns [`EngineError::SeriesLengthMismatch`] for misaligned inputs and
/// [`EngineError::HorizonTooShort`] for fewer than 8 hours.
pub fn plan(
    load: &[f64],
    price: &[f64],
    carbon: &[f64],
    objective: Objective,
    constraints: &Constraints,
) -> Result<ShiftOutcome, EngineError> {
    if load.len() != price.len() || load.len() != carbon.len() {
        return Err(EngineError::SeriesLengthMismatch {
            load: load.len(),
            price: price.len(),
            carbon: carbon.len(),
        });
    }
    let scores = score_hours(load, price, carbon, objective);
    shift_load(&scores, constraints)
}

/// Runs optimizations against a history source and records them in a run store.
///
/// Runs share no mutable state; the engine can be cloned and used from
/// concurrent tasks.
#[derive(Clone)]
pub struct Engine {
    provider: DataProvider,
    store: Arc<dyn RunStore>,
    default_seed: Option<u64>,
}

impl Engine {
    pub fn new(source: Arc<dyn HistorySource>, store: Arc<dyn RunStore>) -> Self {
        Self {
            provider: DataProvider::new(source),
            store,
            default_seed: None,
        }
    }

    /// Seed used for synthetic fill when a request carries none.
    #[must_use]
    pub fn with_default_seed(mut self, seed: Option<u64>) -> Self {
        self.default_seed = seed;
        self
    }

    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Executes one run and persists its record.
    ///
    /// Validation happens before any data is fetched. The only suspension
    /// points are the history query and the store insert.
    ///
    /// # Errors
    ///
    /// Validation errors, or [`EngineError::Store`] if persisting fails.
    #[instrument(
        name = "optimize",
        skip_all,
        fields(
            objective = %request.objective,
            horizon = %request.time_horizon,
            location = %request.location,
        )
    )]
    pub async fn run(&self, request: OptimizationRequest) -> Result<OptimizationResult, EngineError> {
        request.constraints.validate()?;
        let hours = request.time_horizon.hours();
        if hours < MIN_HORIZON_HOURS {
            return Err(EngineError::HorizonTooShort {
                hours,
                min: MIN_HORIZON_HOURS,
            });
        }

        let created_at = Utc::now();
        let start = request.start_time.unwrap_or(created_at);
        let start = start.duration_trunc(TimeDelta::hours(1)).unwrap_or(start);
        let seed = request.seed.or(self.default_seed);

        let data = self
            .provider
            .fetch(&request.location, start, hours, seed)
            .await;

        let outcome = plan(
            &data.load,
            &data.price,
            &data.carbon,
            request.objective,
            &request.constraints,
        )?;

        let assembled = report::assemble(ReportInput {
            created_at,
            objective: request.objective,
            time_horizon: request.time_horizon,
            constraints: request.constraints,
            location: request.location,
            seed,
            data,
            optimized: outcome.schedule,
        })?;

        let savings = &assembled.result.savings;
        info!(
            cost_savings = savings.cost_savings,
            cost_savings_pct = savings.cost_savings_percent,
            emissions_reduction = savings.emissions_reduction,
            peak_reduction = savings.peak_reduction,
            shifted_kw = outcome.shifted_kw,
            clamped_kw = outcome.clamped_kw,
            "optimization complete"
        );

        report::publish(self.store.as_ref(), assembled).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::data::{EmptySource, SeriesOrigin};
    use crate::store::{HistoryQuery, MemoryStore};

    fn engine() -> (Engine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = Engine::new(Arc::new(EmptySource), store.clone());
        (engine, store)
    }

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
    }

    #[test]
    fn plan_rejects_misaligned_inputs() {
        let err = plan(&[1.0; 24], &[0.1; 23], &[1.0; 24], Objective::Cost, &Constraints::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::SeriesLengthMismatch { .. }));
    }

    #[test]
    fn parse_rejects_unknown_horizon() {
        let err = OptimizationRequest::parse("cost", "monthly", "X").unwrap_err();
        assert!(matches!(err, EngineError::InvalidTimeHorizon { .. }));
    }

    #[tokio::test]
    async fn run_records_one_completed_run() {
        let (engine, store) = engine();
        let request = OptimizationRequest::new(Objective::Hybrid, TimeHorizon::Day, "X")
            .with_start_time(monday())
            .with_seed(11);
        let result = engine.run(request).await.unwrap();

        assert_eq!(result.baseline.schedule.len(), 24);
        assert_eq!(result.data_sources.load, SeriesOrigin::Synthetic);

        let stored = store.list(&HistoryQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].run.objective_type, Objective::Hybrid);
        assert_eq!(stored[0].run.baseline_cost, result.baseline.cost);
    }

    #[tokio::test]
    async fn invalid_constraints_fail_before_persisting() {
        let (engine, store) = engine();
        let request = OptimizationRequest::new(Objective::Cost, TimeHorizon::Day, "X")
            .with_constraints(Constraints {
                max_load: -5.0,
                ..Constraints::default()
            });
        let err = engine.run(request).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidConstraint { field: "maxLoad", .. }));
        assert!(store.list(&HistoryQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_start_is_top_of_hour() {
        let (engine, _store) = engine();
        let request = OptimizationRequest::new(Objective::Cost, TimeHorizon::Day, "X");
        let result = engine.run(request).await.unwrap();
        assert_eq!(result.start_time.timestamp() % 3600, 0);
    }

    #[tokio::test]
    async fn explicit_start_is_truncated_to_the_hour() {
        let (engine, store) = engine();
        let request = OptimizationRequest::new(Objective::Cost, TimeHorizon::Day, "X")
            .with_start_time(monday() + TimeDelta::minutes(630))
            .with_seed(1);
        let result = engine.run(request).await.unwrap();

        let expected = monday() + TimeDelta::hours(10);
        assert_eq!(result.start_time, expected);
        assert_eq!(result.inputs.timestamps[0], expected);

        let stored = store.list(&HistoryQuery::default()).await.unwrap();
        assert_eq!(stored[0].run.decoded_parameters().start_time, Some(expected));
    }
}
