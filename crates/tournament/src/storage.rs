//! Persistence of match records, the outcome log and statistics
//!
//! `JsonFileStore` layout under its root directory:
//!
//! ```text
//! matches/<match-id>.json   full match record, one file per attempt
//! outcomes.jsonl            append-only outcome log, one JSON object per line
//! statistics.json           latest aggregate, replaced atomically
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::records::{MatchOutcome, MatchResult};
use crate::stats::TournamentStats;

/// Errors from the result store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record in {path} at line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("match record not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Where match attempts, outcomes and statistics go.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Write one full match record keyed by its match id.
    async fn persist_match(&self, record: &MatchResult) -> StoreResult<()>;

    /// Append one outcome to the ordered log, creating the log if needed.
    async fn append_outcome(&self, outcome: &MatchOutcome) -> StoreResult<()>;

    /// Read the whole outcome log in order. A missing log is empty.
    async fn load_outcomes(&self) -> StoreResult<Vec<MatchOutcome>>;

    /// Replace the statistics artifact.
    async fn persist_statistics(&self, stats: &TournamentStats) -> StoreResult<()>;

    /// Read back one match record.
    async fn load_match(&self, match_id: &str) -> StoreResult<MatchResult>;
}

/// Match ids embed model ids such as `openai/gpt-4o`; keep them to one path
/// component.
pub fn record_file_name(match_id: &str) -> String {
    let safe: String = match_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    format!("{safe}.json")
}

/// JSON files under a tournament log directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn matches_dir(&self) -> PathBuf {
        self.root.join("matches")
    }

    pub fn outcomes_path(&self) -> PathBuf {
        self.root.join("outcomes.jsonl")
    }

    pub fn statistics_path(&self) -> PathBuf {
        self.root.join("statistics.json")
    }

    fn match_path(&self, match_id: &str) -> PathBuf {
        self.matches_dir().join(record_file_name(match_id))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn ensure_dir(dir: &Path) -> StoreResult<()> {
    tokio::fs::create_dir_all(dir).await.map_err(io_err(dir))
}

/// Write via a sibling temp file and rename, so readers never see a partial
/// file.
async fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents).await.map_err(io_err(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err(path))
}

#[async_trait]
impl ResultStore for JsonFileStore {
    async fn persist_match(&self, record: &MatchResult) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.match_path(&record.match_id), &json).await
    }

    async fn append_outcome(&self, outcome: &MatchOutcome) -> StoreResult<()> {
        ensure_dir(&self.root).await?;
        let path = self.outcomes_path();
        let mut line = serde_json::to_vec(outcome)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_err(&path))?;
        file.write_all(&line).await.map_err(io_err(&path))?;
        file.flush().await.map_err(io_err(&path))
    }

    async fn load_outcomes(&self) -> StoreResult<Vec<MatchOutcome>> {
        let path = self.outcomes_path();
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&path)(e)),
        };

        contents
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| {
                serde_json::from_str(l).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    line: i + 1,
                    source,
                })
            })
            .collect()
    }

    async fn persist_statistics(&self, stats: &TournamentStats) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(stats)?;
        write_atomic(&self.statistics_path(), &json).await
    }

    async fn load_match(&self, match_id: &str) -> StoreResult<MatchResult> {
        let path = self.match_path(match_id);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(match_id.to_string()))
            }
            Err(e) => return Err(io_err(&path)(e)),
        };
        Ok(serde_json::from_str(&contents)?)
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    matches: Mutex<HashMap<String, MatchResult>>,
    outcomes: Mutex<Vec<MatchOutcome>>,
    statistics: Mutex<Option<TournamentStats>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the outcome log, as if appended by an earlier run.
    pub fn with_outcomes(outcomes: Vec<MatchOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            ..Default::default()
        }
    }

    pub fn match_count(&self) -> usize {
        self.matches.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn statistics(&self) -> Option<TournamentStats> {
        self.statistics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn persist_match(&self, record: &MatchResult) -> StoreResult<()> {
        self.matches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.match_id.clone(), record.clone());
        Ok(())
    }

    async fn append_outcome(&self, outcome: &MatchOutcome) -> StoreResult<()> {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(outcome.clone());
        Ok(())
    }

    async fn load_outcomes(&self) -> StoreResult<Vec<MatchOutcome>> {
        Ok(self.outcomes.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn persist_statistics(&self, stats: &TournamentStats) -> StoreResult<()> {
        *self.statistics.lock().unwrap_or_else(|e| e.into_inner()) = Some(stats.clone());
        Ok(())
    }

    async fn load_match(&self, match_id: &str) -> StoreResult<MatchResult> {
        self.matches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(match_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(match_id.to_string()))
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
