//! Error types for the trigger-word engine.
//!
//! Almost nothing in this crate surfaces these errors to a workflow: the
//! resolver downgrades them to a missed fallback tier and logs them. They exist
//! so each step can be written with `?` and so collaborator failures (weight
//! loading, merging) have a typed home.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the trigger-word engine.
#[derive(Debug, Error)]
pub enum TriggerError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Registry returned HTTP {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Model container errors
    #[error("Invalid model header in {path}: {message}")]
    InvalidHeader { path: PathBuf, message: String },

    // External engine errors
    #[error("Model engine error: {message}")]
    Engine { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for trigger-word operations.
pub type Result<T> = std::result::Result<T, TriggerError>;

impl From<std::io::Error> for TriggerError {
    fn from(err: std::io::Error) -> Self {
        TriggerError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for TriggerError {
    fn from(err: serde_json::Error) -> Self {
        TriggerError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for TriggerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TriggerError::Timeout(std::time::Duration::from_secs(0))
        } else {
            TriggerError::Network {
                message: err.to_string(),
                cause: Some(err.to_string()),
            }
        }
    }
}

impl TriggerError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        TriggerError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an engine error from any displayable collaborator failure.
    pub fn engine(message: impl std::fmt::Display) -> Self {
        TriggerError::Engine {
            message: message.to_string(),
        }
    }

    /// True for failures that a retry on a later invocation might fix.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TriggerError::Network { .. } | TriggerError::Timeout(_)
        ) || matches!(self, TriggerError::UnexpectedStatus { status, .. } if *status >= 500)
    }
}
