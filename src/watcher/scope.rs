//! Scope trait and action types for the watch router.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::WatchError;

/// What happened to a watched file, from the router's point of view.
///
/// `Added` is reserved for paths whose first observed event was a creation;
/// everything else that still exists on disk is `Changed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// Per-scope readiness. Events observed while a scope is still `Scanning`
/// are backfill from the initial directory walk and must be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Scanning,
    Ready,
}

/// Whether an event observed in the given state may reach a scope handler.
pub fn should_deliver(state: ScopeState) -> bool {
    state == ScopeState::Ready
}

/// Actions returned by scopes for the router to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAction {
    /// Incrementally index the given workspace-relative content paths.
    IndexPaths(Vec<PathBuf>),

    /// Drop the given workspace-relative paths from the content index.
    DeletePaths(Vec<PathBuf>),

    /// Re-run codegen from the current schema snapshot. The content index
    /// and the base schema are left untouched.
    RegenerateCodegen,

    /// Nothing to do (e.g., extension not covered by any collection).
    None,
}

/// A named glob-bound watch scope.
///
/// Scopes declare the directories they need watched and turn individual
/// path events into actions. They never touch the index or the artifact
/// tree themselves.
#[async_trait]
pub trait ScopeHandler: Send + Sync {
    /// Scope name for logging.
    fn name(&self) -> &str;

    /// Check if this scope covers the given workspace-relative path.
    fn matches(&self, rel: &Path) -> bool;

    /// Workspace-relative directories the router must watch for this scope.
    fn watch_roots(&self) -> Vec<PathBuf>;

    /// Turn a single path event into an action.
    async fn route(&self, rel: &Path, kind: ChangeKind) -> Result<RouteAction, WatchError>;
}
