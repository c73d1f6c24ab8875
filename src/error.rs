//! Error types for the sync engine.
//!
//! One top-level taxonomy covers the reconcile pipeline; the watcher keeps
//! its own module-local error type and converts at the boundary.

use std::path::PathBuf;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the reconcile pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum SyncError {
    /// API connection fields required for codegen are absent. The message
    /// enumerates exactly the missing fields, in checked order.
    #[error(
        "missing required API configuration: {fields}. Add the missing fields under [api] in settings.toml, set api.override_url, or run in dev mode with --port",
        fields = missing.join(", ")
    )]
    Configuration { missing: Vec<&'static str> },

    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("schema build failed: {reason}")]
    SchemaBuild { reason: String },

    #[error("failed to index {path}: {reason}")]
    Index { path: PathBuf, reason: String },

    #[error("{path}: missing required field '{field}' for collection '{collection}'")]
    MissingField {
        path: PathBuf,
        field: String,
        collection: String,
    },

    #[error("{path}: field '{field}' has the wrong type, expected {expected}")]
    FieldType {
        path: PathBuf,
        field: String,
        expected: &'static str,
    },

    #[error("{path}: no collection matches this file")]
    UnknownCollection { path: PathBuf },

    #[error(transparent)]
    Watch(#[from] crate::watcher::WatchError),

    #[error("subcommand failed: {reason}")]
    Subprocess { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
