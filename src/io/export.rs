//! CSV export of baseline and optimized schedules.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::optimize::report::OptimizationResult;

/// Column header for schedule export.
const HEADER: &str = "hour,timestamp,baseline_kw,optimized_kw,price_per_kwh,carbon_g_per_kwh";

/// Exports a run's schedules to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_schedule_csv(result: &OptimizationResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_schedule_csv(result, buf)
}

/// Writes one row per hour: index, RFC 3339 start time, both loads, and the
/// price and carbon intensity the hour was scored with.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_schedule_csv(result: &OptimizationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(','))?;

    let inputs = &result.inputs;
    let rows = inputs
        .timestamps
        .iter()
        .zip(&result.baseline.schedule)
        .zip(&result.optimized.schedule)
        .zip(inputs.price.iter().zip(&inputs.carbon))
        .enumerate();

    for (hour, (((at, baseline), optimized), (price, carbon))) in rows {
        wtr.write_record(&[
            hour.to_string(),
            at.to_rfc3339(),
            format!("{baseline:.4}"),
            format!("{optimized:.4}"),
            format!("{price:.4}"),
            format!("{carbon:.2}"),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::data::EmptySource;
    use crate::optimize::engine::{Engine, OptimizationRequest};
    use crate::optimize::types::{Objective, TimeHorizon};
    use crate::store::MemoryStore;

    async fn result() -> OptimizationResult {
        let engine = Engine::new(Arc::new(EmptySource), Arc::new(MemoryStore::new()));
        let request = OptimizationRequest::new(Objective::Cost, TimeHorizon::Day, "X")
            .with_start_time(Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap())
            .with_seed(9);
        engine.run(request).await.unwrap()
    }

    #[tokio::test]
    async fn header_and_one_row_per_hour() {
        let mut buf = Vec::new();
        write_schedule_csv(&result().await, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 25);
        assert!(lines[1].starts_with("0,2024-03-04T00:00:00+00:00,"));
    }

    #[tokio::test]
    async fn numeric_columns_parse() {
        let mut buf = Vec::new();
        write_schedule_csv(&result().await, &mut buf).unwrap();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        for record in rdr.records() {
            let rec = record.unwrap();
            for i in 2..6 {
                assert!(rec[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
        }
    }
}
