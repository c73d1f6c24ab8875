//! Error types for the watch router.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watch registration and routing.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    Setup { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatch { path: PathBuf, reason: String },

    #[error("File system event error: {details}")]
    Event { details: String },

    #[error("Scope '{scope}' failed for {path}: {reason}")]
    Scope {
        scope: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::Setup {
            reason: e.to_string(),
        }
    }
}
