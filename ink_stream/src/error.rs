//! Error types for ink_stream.
//!
//! Only configuration, replay files and I/O can fail. Inconsistent input that
//! reaches a stage is logged and skipped instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON event log, config or replay case.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value outside its valid range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A replay case that cannot be run as written.
    #[error("invalid replay case {name}: {message}")]
    InvalidReplay { name: String, message: String },

    /// Delivering the same events in chunks produced a different result.
    #[error("replay {name} diverged at {stage} when split at {splits:?}")]
    Diverged {
        name: String,
        stage: &'static str,
        splits: Vec<usize>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
