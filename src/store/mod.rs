//! Run persistence: pluggable backends for [`OptimizationRun`] records.
//!
//! - [`MemoryStore`]: process-local, for tests and one-shot CLI runs
//! - [`JsonlStore`]: append-only JSON-lines file

pub mod history;
mod jsonl;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::optimize::report::OptimizationRun;
use crate::optimize::types::Objective;

pub use history::{ObjectiveStats, RunStats, RunSummary};
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

/// Default number of runs returned by a history listing.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("run store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("run store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("run store unavailable: {0}")]
    Unavailable(String),
}

/// Filter for [`RunStore::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    pub limit: usize,
    pub objective: Option<Objective>,
}

impl HistoryQuery {
    /// Every stored run, unfiltered.
    pub fn all() -> Self {
        Self {
            limit: usize::MAX,
            objective: None,
        }
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_HISTORY_LIMIT,
            objective: None,
        }
    }
}

/// A run record with the id its store assigned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRun {
    pub id: u64,
    pub run: OptimizationRun,
}

/// Backend that persists run records.
///
/// Implementations must be `Send + Sync`; the engine shares one store across
/// concurrent runs.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Inserts a record and returns its id.
    async fn create(&self, run: &OptimizationRun) -> Result<u64, StoreError>;

    /// Lists records most recent first, filtered and truncated by `query`.
    async fn list(&self, query: &HistoryQuery) -> Result<Vec<StoredRun>, StoreError>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}

/// Applies a [`HistoryQuery`] to records in insertion order.
fn select(mut runs: Vec<StoredRun>, query: &HistoryQuery) -> Vec<StoredRun> {
    if let Some(objective) = query.objective {
        runs.retain(|r| r.run.objective_type == objective);
    }
    runs.sort_by(|a, b| {
        b.run
            .created_at
            .cmp(&a.run.created_at)
            .then(b.id.cmp(&a.id))
    });
    runs.truncate(query.limit);
    runs
}
