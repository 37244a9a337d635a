//! TOML-based engine configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::data::{CsvSource, EmptySource, HistorySource, SourceError};
use crate::error::EngineError;
use crate::optimize::engine::OptimizationRequest;
use crate::optimize::types::{Constraints, Objective, TimeHorizon};
use crate::store::{JsonlStore, MemoryStore, RunStore};

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults. Load from TOML with [`Config::from_toml_file`]
/// or start from a preset with [`Config::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub constraints: ConstraintsConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Request defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Key into the history source.
    pub location: String,
    /// Seed for synthetic load noise. Unset draws from the OS.
    pub seed: Option<u64>,
    /// `"24h"` or `"weekly"`.
    pub time_horizon: String,
    /// `"cost"`, `"co2"` or `"hybrid"`.
    pub objective: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            location: "default".to_string(),
            seed: None,
            time_horizon: TimeHorizon::Day.as_str().to_string(),
            objective: Objective::Cost.as_str().to_string(),
        }
    }
}

/// Load limits applied to the optimized schedule.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstraintsConfig {
    /// Ceiling on hourly load (kW).
    pub max_load: f64,
    /// Renewable share target (%). Recorded with each run.
    pub renewable_target: f64,
    /// Shift 20% of peak load when true, 10% otherwise.
    pub demand_response: bool,
}

impl Default for ConstraintsConfig {
    fn default() -> Self {
        let c = Constraints::default();
        Self {
            max_load: c.max_load,
            renewable_target: c.renewable_target,
            demand_response: c.demand_response,
        }
    }
}

impl From<&ConstraintsConfig> for Constraints {
    fn from(c: &ConstraintsConfig) -> Self {
        Self {
            max_load: c.max_load,
            renewable_target: c.renewable_target,
            demand_response: c.demand_response,
        }
    }
}

/// History input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// CSV of `location,timestamp,load_kw,price_per_kwh,carbon_g_per_kwh`.
    /// Unset means every series is synthetic.
    pub history_csv: Option<PathBuf>,
}

/// Run record persistence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON-lines file. Unset keeps runs in memory.
    pub runs_path: Option<PathBuf>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"constraints.max_load"`).
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "conservative", "capped"];

    /// Shifts only 10% of peak load.
    pub fn conservative() -> Self {
        Self {
            constraints: ConstraintsConfig {
                demand_response: false,
                ..ConstraintsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Caps hourly load at 800 kW.
    pub fn capped() -> Self {
        Self {
            constraints: ConstraintsConfig {
                max_load: 800.0,
                ..ConstraintsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default()),
            "conservative" => Ok(Self::conservative()),
            "capped" => Ok(Self::capped()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let e = &self.engine;

        if let Err(err) = e.objective.parse::<Objective>() {
            errors.push(ConfigError {
                field: "engine.objective".into(),
                message: err.to_string(),
            });
        }
        if let Err(err) = e.time_horizon.parse::<TimeHorizon>() {
            errors.push(ConfigError {
                field: "engine.time_horizon".into(),
                message: err.to_string(),
            });
        }

        let c = &self.constraints;
        if !c.max_load.is_finite() || c.max_load < 0.0 {
            errors.push(ConfigError {
                field: "constraints.max_load".into(),
                message: "must be a finite number >= 0".into(),
            });
        }
        if !c.renewable_target.is_finite() {
            errors.push(ConfigError {
                field: "constraints.renewable_target".into(),
                message: "must be a finite number".into(),
            });
        }

        errors
    }

    /// Builds a run request from the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if the objective or horizon name is unknown.
    pub fn request(&self) -> Result<OptimizationRequest, EngineError> {
        let mut request = OptimizationRequest::parse(
            &self.engine.objective,
            &self.engine.time_horizon,
            self.engine.location.clone(),
        )?
        .with_constraints(Constraints::from(&self.constraints));
        request.seed = self.engine.seed;
        Ok(request)
    }

    /// Opens the configured history source.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the history CSV cannot be read.
    pub fn history_source(&self) -> Result<Arc<dyn HistorySource>, SourceError> {
        let source: Arc<dyn HistorySource> = match &self.data.history_csv {
            Some(path) => Arc::new(CsvSource::from_path(path)?),
            None => Arc::new(EmptySource),
        };
        Ok(source)
    }

    /// Opens the configured run store.
    pub fn run_store(&self) -> Arc<dyn RunStore> {
        match &self.store.runs_path {
            Some(path) => Arc::new(JsonlStore::new(path.clone())),
            None => Arc::new(MemoryStore::new()),
        }
    }
}
