use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use super::{HistoryQuery, RunStore, StoreError, StoredRun, select};
use crate::optimize::report::OptimizationRun;

/// Append-only JSON-lines run store.
///
/// Each record is one line; its id is its 1-based line number among
/// non-blank lines. Lines that fail to parse are skipped with a warning.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    /// Serializes appends so ids stay dense.
    write_lock: Mutex<()>,
}

impl JsonlStore {
    /// Opens (or lazily creates) the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_lines(&self) -> Result<Vec<String>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl RunStore for JsonlStore {
    async fn create(&self, run: &OptimizationRun) -> Result<u64, StoreError> {
        let mut line = serde_json::to_string(run)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let id = self.read_lines().await?.len() as u64 + 1;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(id)
    }

    async fn list(&self, query: &HistoryQuery) -> Result<Vec<StoredRun>, StoreError> {
        let mut runs = Vec::new();
        for (i, line) in self.read_lines().await?.iter().enumerate() {
            let id = i as u64 + 1;
            match serde_json::from_str::<OptimizationRun>(line) {
                Ok(run) => runs.push(StoredRun { id, run }),
                Err(e) => warn!(path = %self.path.display(), id, error = %e, "skipping malformed run record"),
            }
        }
        Ok(select(runs, query))
    }

    fn backend_name(&self) -> &'static str {
        "jsonl"
    }
}
