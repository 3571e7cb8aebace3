//! Error taxonomy for the review pipeline.

use std::path::PathBuf;

/// Errors produced while running a review.
#[derive(Debug, thiserror::Error)]
pub enum RevetError {
    #[error("invalid clone url {url}: {reason}")]
    CloneUrl { url: String, reason: String },

    #[error("git error: {0}")]
    Git(String),

    #[error("failed to launch `{program}`: {source}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stage `{0}` has an empty command")]
    EmptyCommand(String),

    #[error("workspace error at {}: {source}", path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("api request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api returned {status} for {url}: {body}")]
    ApiStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for review operations.
pub type Result<T> = std::result::Result<T, RevetError>;
