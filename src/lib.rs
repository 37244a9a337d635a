//! Hourly load-shift optimization for cost, carbon, or a blend of both.
//!
//! [`optimize::Engine`] fetches aligned load, price and carbon series,
//! moves a fraction of load out of the worst-scoring hours into the best
//! ones, and records the before/after comparison in a [`store::RunStore`].

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod optimize;
pub mod store;

pub use error::EngineError;
