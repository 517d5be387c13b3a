//! Error types
//!
//! Only resource acquisition and persistence can fail. Gameplay conditions
//! (no match, word already resolved) are reported as values, never as errors.

use std::path::PathBuf;

/// Word list could not be obtained; the round does not start
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("stage {0} does not exist")]
    UnknownStage(u32),

    #[error("stage {0} has an empty word list")]
    EmptyWordList(u32),

    #[error("failed to read word list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed word list {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Round result could not be stored; logged and otherwise ignored
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("result data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("result rejected: {0}")]
    Rejected(String),
}

/// Settings file problems
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
