//! Error types for the content engine

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by blog queries
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Post '{0}' not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Content directory {path:?} is unavailable: {source}")]
    RepositoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out reading {path:?} after {timeout:?}")]
    ReadTimeout { path: PathBuf, timeout: Duration },

    #[error("Failed to render post '{slug}': {source}")]
    Render {
        slug: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Invalid configuration in {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}

impl BlogError {
    /// Whether this error concerns a single post file, as opposed to the whole request
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            BlogError::FileRead { .. } | BlogError::ReadTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
