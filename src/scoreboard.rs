//! Persisted history of final scores.
//!
//! The history is a JSON array of scores, best first, truncated to the
//! configured capacity. Storage failures never stop the game: a history that
//! cannot be read starts empty and a failed write keeps the in-memory copy.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ScoreboardError {
    #[error("score history I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("score history is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-N final scores, in descending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    scores: Vec<u64>,
    capacity: usize,
    path: Option<PathBuf>,
}

impl Scoreboard {
    /// History kept in memory only.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            scores: Vec::new(),
            capacity,
            path: None,
        }
    }

    /// History backed by `path`. A missing or unreadable file yields an
    /// empty history.
    pub fn load(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let scores = match read_scores(&path) {
            Ok(scores) => scores,
            Err(ScoreboardError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                warn!(path = %path.display(), %err, "ignoring unreadable score history");
                Vec::new()
            }
        };
        let mut board = Self {
            scores,
            capacity,
            path: Some(path),
        };
        board.normalize();
        board
    }

    /// In-memory or file-backed depending on `path`.
    pub fn open(path: Option<&Path>, capacity: usize) -> Self {
        match path {
            Some(path) => Self::load(path, capacity),
            None => Self::in_memory(capacity),
        }
    }

    pub fn scores(&self) -> &[u64] {
        &self.scores
    }

    pub fn best(&self) -> Option<u64> {
        self.scores.first().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn normalize(&mut self) {
        self.scores.sort_unstable_by(|a, b| b.cmp(a));
        self.scores.truncate(self.capacity);
    }

    /// Add a final score and persist the history.
    ///
    /// Returns the 0-based rank of the score, or `None` if it did not make
    /// the cut.
    pub fn record(&mut self, score: u64) -> Option<usize> {
        self.scores.push(score);
        self.normalize();
        let rank = self.scores.iter().position(|&s| s == score);
        if let Err(err) = self.save() {
            warn!(%err, "failed to persist score history");
        }
        rank
    }

    fn save(&self) -> Result<(), ScoreboardError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&self.scores)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn read_scores(path: &Path) -> Result<Vec<u64>, ScoreboardError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
