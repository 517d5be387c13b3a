//! Round result payload and where it goes

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::sim::round::{EndCause, RoundState};

/// Summary produced once when a round ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub stage: u32,
    pub score: u64,
    /// Percent of typed characters that were correct
    pub accuracy: f64,
    #[serde(rename = "words_completed")]
    pub completed: u32,
    #[serde(rename = "words_missed")]
    pub missed: u32,
    pub outcome: EndCause,
}

impl RoundResult {
    pub fn from_state(stage: u32, state: &RoundState, outcome: EndCause) -> Self {
        Self {
            stage,
            score: state.score,
            accuracy: state.accuracy(),
            completed: state.completed,
            missed: state.missed,
            outcome,
        }
    }

    /// Stage was finished rather than lost
    pub fn cleared(&self) -> bool {
        self.outcome == EndCause::Completed
    }
}

/// Receives round results. Failures are reported, never retried.
pub trait ResultSink {
    fn submit(&mut self, result: &RoundResult) -> Result<(), PersistenceError>;
}

/// Writes results to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ResultSink for LogSink {
    fn submit(&mut self, result: &RoundResult) -> Result<(), PersistenceError> {
        log::info!(
            "Result: stage {} score {} accuracy {:.1}% ({} completed, {} missed, {:?})",
            result.stage,
            result.score,
            result.accuracy,
            result.completed,
            result.missed,
            result.outcome
        );
        Ok(())
    }
}

/// Appends one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonlResultLog {
    path: PathBuf,
}

impl JsonlResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every stored result, oldest first
    pub fn read_all(&self) -> Result<Vec<RoundResult>, PersistenceError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(PersistenceError::from))
            .collect()
    }
}

impl ResultSink for JsonlResultLog {
    fn submit(&mut self, result: &RoundResult) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(result)?;
        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "{line}").map_err(io_err)?;
        log::debug!("Result appended to {}", self.path.display());
        Ok(())
    }
}

/// In-memory collection, handy for hosts that batch uploads
impl ResultSink for Vec<RoundResult> {
    fn submit(&mut self, result: &RoundResult) -> Result<(), PersistenceError> {
        self.push(result.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(outcome: EndCause) -> RoundResult {
        let mut state = RoundState::new();
        state.score = 420;
        state.completed = 18;
        state.missed = 2;
        state.correct_chars = 90;
        state.total_chars = 100;
        RoundResult::from_state(4, &state, outcome)
    }

    #[test]
    fn test_payload_field_names() {
        let json = serde_json::to_value(sample(EndCause::Completed)).unwrap();
        assert_eq!(json["stage"], 4);
        assert_eq!(json["score"], 420);
        assert_eq!(json["accuracy"], 90.0);
        assert_eq!(json["words_completed"], 18);
        assert_eq!(json["words_missed"], 2);
        assert_eq!(json["outcome"], "Completed");
    }

    #[test]
    fn test_cleared() {
        assert!(sample(EndCause::Completed).cleared());
        assert!(!sample(EndCause::GameOver).cleared());
    }

    #[test]
    fn test_jsonl_appends() {
        let path = std::env::temp_dir().join(format!("sea_typer_results_{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let mut sink = JsonlResultLog::new(&path);
        sink.submit(&sample(EndCause::Completed)).unwrap();
        sink.submit(&sample(EndCause::GameOver)).unwrap();

        let stored = sink.read_all().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].outcome, EndCause::GameOver);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = std::env::temp_dir();
        // A directory cannot be opened for appending
        let mut sink = JsonlResultLog::new(&dir);
        assert!(matches!(
            sink.submit(&sample(EndCause::Completed)),
            Err(PersistenceError::Io { .. })
        ));
    }
}
