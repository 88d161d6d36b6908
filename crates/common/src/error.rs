//! Error types shared across stripcut crates.

use std::path::PathBuf;

/// Top-level error type for stripcut operations.
#[derive(Debug, thiserror::Error)]
pub enum StripcutError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Strip description error: {message}")]
    Description { message: String },

    #[error("Timeline document error: {message}")]
    Timeline { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using StripcutError.
pub type StripcutResult<T> = Result<T, StripcutError>;

impl StripcutError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn description(msg: impl Into<String>) -> Self {
        Self::Description {
            message: msg.into(),
        }
    }

    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }
}
