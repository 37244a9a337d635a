use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use loadshift::config::Config;
use loadshift::optimize::types::{Objective, TimeHorizon};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Optimize one horizon and record the run.
    #[clap(name = "optimize")]
    Optimize(Box<OptimizeArgs>),

    /// List recorded runs, most recent first.
    #[clap(name = "history")]
    History(HistoryArgs),

    /// Aggregate savings over completed runs.
    #[clap(name = "stats")]
    Stats(StatsArgs),

    /// Serve the HTTP API.
    #[cfg(feature = "api")]
    #[clap(name = "serve")]
    Serve(ServeArgs),
}

/// Where configuration comes from. Flags given on the command line override it.
#[derive(Args)]
pub struct ConfigArgs {
    /// TOML configuration file.
    #[clap(long, env = "LOADSHIFT_CONFIG", conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in preset: default, conservative, capped.
    #[clap(long)]
    pub preset: Option<String>,

    /// JSON-lines run store; runs are kept in memory when unset.
    #[clap(long = "runs", env = "LOADSHIFT_RUNS")]
    pub runs: Option<PathBuf>,
}

impl ConfigArgs {
    /// Loads the file or preset and applies the store override.
    pub fn load(&self) -> anyhow::Result<Config> {
        let mut config = match (&self.config, &self.preset) {
            (Some(path), _) => Config::from_toml_file(path)?,
            (None, Some(name)) => Config::from_preset(name)?,
            (None, None) => Config::default(),
        };
        if let Some(runs) = &self.runs {
            config.store.runs_path = Some(runs.clone());
        }
        Ok(config)
    }
}

#[derive(Args)]
pub struct OptimizeArgs {
    #[clap(flatten)]
    pub config: ConfigArgs,

    /// cost, co2 or hybrid.
    #[clap(long)]
    pub objective: Option<Objective>,

    /// 24h or weekly.
    #[clap(long = "time-horizon")]
    pub time_horizon: Option<TimeHorizon>,

    /// Ceiling on hourly load in kilowatts.
    #[clap(long = "max-load")]
    pub max_load: Option<f64>,

    /// Renewable share target, percent.
    #[clap(long = "renewable-target")]
    pub renewable_target: Option<f64>,

    /// Shift 10% of peak load instead of 20%.
    #[clap(long = "no-demand-response")]
    pub no_demand_response: bool,

    #[clap(long)]
    pub location: Option<String>,

    /// Seed for synthetic load noise.
    #[clap(long)]
    pub seed: Option<u64>,

    /// First hour of the horizon, RFC 3339. Defaults to the current hour.
    #[clap(long)]
    pub start: Option<DateTime<Utc>>,

    /// History CSV: location,timestamp,load_kw,price_per_kwh,carbon_g_per_kwh.
    #[clap(long = "history-csv")]
    pub history_csv: Option<PathBuf>,

    /// Write baseline and optimized schedules as CSV.
    #[clap(long = "schedule-out")]
    pub schedule_out: Option<PathBuf>,

    /// Print the full result as JSON instead of a summary.
    #[clap(long)]
    pub json: bool,
}

impl OptimizeArgs {
    /// Applies the command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(objective) = self.objective {
            config.engine.objective = objective.to_string();
        }
        if let Some(horizon) = self.time_horizon {
            config.engine.time_horizon = horizon.to_string();
        }
        if let Some(max_load) = self.max_load {
            config.constraints.max_load = max_load;
        }
        if let Some(target) = self.renewable_target {
            config.constraints.renewable_target = target;
        }
        if self.no_demand_response {
            config.constraints.demand_response = false;
        }
        if let Some(location) = &self.location {
            config.engine.location.clone_from(location);
        }
        if self.seed.is_some() {
            config.engine.seed = self.seed;
        }
        if let Some(path) = &self.history_csv {
            config.data.history_csv = Some(path.clone());
        }
    }
}

#[derive(Args)]
pub struct HistoryArgs {
    #[clap(flatten)]
    pub config: ConfigArgs,

    #[clap(long, default_value_t = loadshift::store::DEFAULT_HISTORY_LIMIT)]
    pub limit: usize,

    /// Only runs with this objective.
    #[clap(long)]
    pub objective: Option<Objective>,
}

#[derive(Args)]
pub struct StatsArgs {
    #[clap(flatten)]
    pub config: ConfigArgs,
}

#[cfg(feature = "api")]
#[derive(Args)]
pub struct ServeArgs {
    #[clap(flatten)]
    pub config: ConfigArgs,

    #[clap(long, default_value = "3000", env = "LOADSHIFT_PORT")]
    pub port: u16,
}
