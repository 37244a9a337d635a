//! Input data: history sources, synthetic profiles, and hour alignment.

pub mod provider;
/// Historical range-query backends.
pub mod source;
/// Synthetic load, price and carbon-intensity profiles.
pub mod synthetic;
pub mod types;

pub use provider::DataProvider;
pub use source::{CsvSource, EmptySource, HistorySource, MemorySource, SourceError};
pub use types::{HourlyData, Provenance, SeriesBundle, SeriesOrigin, TimeSeriesPoint};
