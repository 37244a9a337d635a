//! loadshift entry point: CLI wiring and config-driven engine construction.

mod cli;

use std::io::{self, Write};

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{error, info};

use loadshift::config::Config;
use loadshift::io::export::export_schedule_csv;
use loadshift::optimize::report::OptimizationResult;
use loadshift::optimize::Engine;
use loadshift::store::{HistoryQuery, history};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Optimize(args) => {
            let mut config = args.config.load()?;
            args.apply(&mut config);
            let config = validated(config)?;

            let source = config
                .history_source()
                .context("failed to open history source")?;
            let engine = Engine::new(source, config.run_store());

            let mut request = config.request()?;
            request.start_time = args.start;
            let result = engine.run(request).await?;

            if let Some(path) = &args.schedule_out {
                export_schedule_csv(&result, path)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                info!(path = %path.display(), "schedule exported");
            }

            let mut out = io::stdout().lock();
            if args.json {
                serde_json::to_writer_pretty(&mut out, &result)?;
                writeln!(out)?;
            } else {
                print_summary(&mut out, &result)?;
            }
        }
        Command::History(args) => {
            let config = validated(args.config.load()?)?;
            let store = config.run_store();
            let query = HistoryQuery {
                limit: args.limit,
                objective: args.objective,
            };
            let runs = history::history(store.as_ref(), &query).await?;
            serde_json::to_writer_pretty(io::stdout().lock(), &runs)?;
            println!();
        }
        Command::Stats(args) => {
            let config = validated(args.config.load()?)?;
            let stats = history::stats(config.run_store().as_ref()).await?;
            serde_json::to_writer_pretty(io::stdout().lock(), &stats)?;
            println!();
        }
        #[cfg(feature = "api")]
        Command::Serve(args) => {
            let config = validated(args.config.load()?)?;
            let source = config
                .history_source()
                .context("failed to open history source")?;
            let state = loadshift::api::AppState {
                engine: Engine::new(source, config.run_store())
                    .with_default_seed(config.engine.seed),
                defaults: config,
            };
            let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));
            loadshift::api::serve(std::sync::Arc::new(state), addr).await?;
        }
    }

    Ok(())
}

/// Logs every validation error and fails if there were any.
fn validated(config: Config) -> anyhow::Result<Config> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        error!("{e}");
    }
    bail!("configuration has {} error(s)", errors.len())
}

fn print_summary(out: &mut impl Write, result: &OptimizationResult) -> io::Result<()> {
    let (b, o, s) = (&result.baseline, &result.optimized, &result.savings);
    writeln!(
        out,
        "run {} | {} | {} from {} | {}",
        result.run_id,
        result.objective,
        result.time_horizon,
        result.start_time.to_rfc3339(),
        result.location
    )?;
    writeln!(out, "{:<12} {:>12} {:>12} {:>12}", "", "baseline", "optimized", "saved")?;
    writeln!(
        out,
        "{:<12} {:>12.2} {:>12.2} {:>11.2}%",
        "cost ($)", b.cost, o.cost, s.cost_savings_percent
    )?;
    writeln!(
        out,
        "{:<12} {:>12.2} {:>12.2} {:>11.2}%",
        "co2 (kg)", b.emissions, o.emissions, s.emissions_reduction_percent
    )?;
    writeln!(
        out,
        "{:<12} {:>12.2} {:>12.2} {:>11.2}%",
        "peak (kW)", b.peak_load, o.peak_load, s.peak_reduction_percent
    )?;
    writeln!(
        out,
        "{:<12} {:>11.2}% {:>11.2}%",
        "renewable", b.renewable, o.renewable
    )
}
