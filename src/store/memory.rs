use std::sync::RwLock;

use async_trait::async_trait;

use super::{HistoryQuery, RunStore, StoreError, StoredRun, select};
use crate::optimize::report::OptimizationRun;

/// In-memory run store. Not durable; records are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    runs: RwLock<Vec<StoredRun>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for MemoryStore {
    async fn create(&self, run: &OptimizationRun) -> Result<u64, StoreError> {
        let mut runs = self
            .runs
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let id = runs.len() as u64 + 1;
        runs.push(StoredRun {
            id,
            run: run.clone(),
        });
        Ok(id)
    }

    async fn list(&self, query: &HistoryQuery) -> Result<Vec<StoredRun>, StoreError> {
        let runs = self
            .runs
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .clone();
        Ok(select(runs, query))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
