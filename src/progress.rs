//! Per-stage progress book
//!
//! Persisted as JSON, tracks the best result per stage and the last few rounds.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::MAX_STAGE;
use crate::error::PersistenceError;
use crate::results::{ResultSink, RoundResult};

/// Maximum number of recent results to keep
pub const MAX_RECENT: usize = 10;

/// Best marks for one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub best_score: u64,
    pub best_accuracy: f64,
    pub attempts: u32,
    /// Finished at least once
    pub cleared: bool,
}

/// What a recorded result changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordOutcome {
    pub new_best_score: bool,
    pub new_best_accuracy: bool,
    /// The stage was cleared for the first time
    pub first_clear: bool,
}

/// Progress across stages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressBook {
    pub stages: BTreeMap<u32, StageRecord>,
    /// Most recent first
    pub recent: Vec<RoundResult>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl ProgressBook {
    /// Create an empty, unsaved book
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the book stored at `path`, or start fresh; later results are saved there
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut book = match Self::load(&path) {
            Ok(book) => {
                log::info!("Loaded progress for {} stages", book.stages.len());
                book
            }
            Err(err) => {
                log::info!("No progress loaded ({err}), starting fresh");
                Self::new()
            }
        };
        book.path = Some(path);
        book
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Progress saved ({} stages)", self.stages.len());
        Ok(())
    }

    /// Fold a result into the book
    pub fn record(&mut self, result: &RoundResult) -> RecordOutcome {
        let entry = self.stages.entry(result.stage).or_default();
        let first_attempt = entry.attempts == 0;
        entry.attempts += 1;

        let outcome = RecordOutcome {
            new_best_score: result.score > entry.best_score,
            new_best_accuracy: first_attempt || result.accuracy > entry.best_accuracy,
            first_clear: result.cleared() && !entry.cleared,
        };
        if outcome.new_best_score {
            entry.best_score = result.score;
        }
        if outcome.new_best_accuracy {
            entry.best_accuracy = result.accuracy;
        }
        entry.cleared |= result.cleared();

        self.recent.insert(0, result.clone());
        self.recent.truncate(MAX_RECENT);
        outcome
    }

    /// Highest playable stage: one past the highest cleared stage
    pub fn unlocked_stage(&self) -> u32 {
        self.stages
            .iter()
            .filter(|(_, record)| record.cleared)
            .map(|(&stage, _)| stage + 1)
            .max()
            .unwrap_or(1)
            .min(MAX_STAGE)
    }

    pub fn record_for(&self, stage: u32) -> Option<&StageRecord> {
        self.stages.get(&stage)
    }

    /// Best score over all stages
    pub fn top_score(&self) -> Option<u64> {
        self.stages.values().map(|r| r.best_score).max()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl ResultSink for ProgressBook {
    fn submit(&mut self, result: &RoundResult) -> Result<(), PersistenceError> {
        let outcome = self.record(result);
        if outcome.first_clear {
            log::info!("Stage {} cleared for the first time", result.stage);
        }
        match &self.path {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }
}
