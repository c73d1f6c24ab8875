//! Watch router: one notify watcher, events routed to registered scopes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Duration, sleep, timeout};

use crate::index::ContentIndex;
use crate::reconcile::Reconciler;

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::scope::{ChangeKind, RouteAction, ScopeHandler, ScopeState, should_deliver};

struct ScopeEntry {
    handler: Box<dyn ScopeHandler>,
    state: ScopeState,
}

/// Routes file events to watch scopes and executes the actions they return.
///
/// Owns the single `notify::RecommendedWatcher` for the session, the shared
/// debouncer, and the per-scope readiness state. Scope handler failures are
/// logged and never stop the loop; only registration failures are fatal.
pub struct WatchRouter {
    scopes: Vec<ScopeEntry>,
    debouncer: Debouncer,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    _watcher: notify::RecommendedWatcher,
    reconciler: Arc<Reconciler>,
    index: Arc<RwLock<ContentIndex>>,
    workspace_root: PathBuf,
    markers: Vec<String>,
    settle: Duration,
    /// Paths whose first observed event was a creation, pending debounce.
    fresh: HashSet<PathBuf>,
}

impl WatchRouter {
    /// Create a builder for configuring the router.
    pub fn builder() -> WatchRouterBuilder {
        WatchRouterBuilder::new()
    }

    /// Register every scope's watch roots with the OS watcher.
    ///
    /// A root that cannot be watched aborts startup; a dev session without
    /// its watchers cannot keep artifacts consistent.
    pub fn register(&mut self) -> Result<(), WatchError> {
        let mut dirs = 0usize;
        for entry in &self.scopes {
            for root in entry.handler.watch_roots() {
                let abs = if root.is_absolute() {
                    root.clone()
                } else {
                    self.workspace_root.join(&root)
                };
                if !abs.is_dir() {
                    return Err(WatchError::PathWatch {
                        path: abs,
                        reason: "directory does not exist".to_string(),
                    });
                }
                self._watcher
                    .watch(&abs, RecursiveMode::Recursive)
                    .map_err(|e| WatchError::PathWatch {
                        path: abs.clone(),
                        reason: e.to_string(),
                    })?;
                crate::debug_event!("watcher", "watching", "{}", abs.display());
                dirs += 1;
            }
        }
        crate::log_event!("watcher", "monitoring", "{dirs} directories");
        Ok(())
    }

    /// Run the event loop. Never returns under normal operation.
    ///
    /// Events observed during the settle window are the watcher's backfill
    /// of pre-existing files and are dropped; scopes flip to ready once the
    /// window passes without traffic.
    pub async fn run(mut self) -> Result<(), WatchError> {
        self.drain_backfill().await;
        for entry in &mut self.scopes {
            entry.state = ScopeState::Ready;
            crate::debug_event!(entry.handler.name(), "ready");
        }
        crate::log_event!("watcher", "started");

        loop {
            let flush = sleep(Duration::from_millis(100));
            tokio::pin!(flush);

            tokio::select! {
                maybe = self.event_rx.recv() => {
                    match maybe {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => {
                            tracing::error!("[watcher] file watch error: {e}");
                        }
                        None => return Err(WatchError::ChannelClosed),
                    }
                }

                _ = &mut flush => {
                    let ready = self.debouncer.take_ready();
                    for rel in ready {
                        let kind = self.settled_kind(&rel);
                        self.dispatch(&rel, kind).await;
                    }
                }
            }
        }
    }

    async fn drain_backfill(&mut self) {
        loop {
            match timeout(self.settle, self.event_rx.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }
    }

    /// Translate raw notify events into debounced, workspace-relative work.
    /// Deletions skip the debounce window and dispatch immediately.
    async fn handle_event(&mut self, event: Event) {
        for path in event.paths {
            let rel = match path.strip_prefix(&self.workspace_root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };
            if path_contains_marker(&rel, &self.markers) {
                crate::debug_event!("watcher", "suppressed", "{}", rel.display());
                continue;
            }
            if !self.scopes.iter().any(|s| s.handler.matches(&rel)) {
                continue;
            }

            match event.kind {
                EventKind::Create(_) => {
                    self.fresh.insert(rel.clone());
                    self.debouncer.record(rel);
                }
                EventKind::Modify(_) => {
                    self.debouncer.record(rel);
                }
                EventKind::Remove(_) => {
                    self.debouncer.remove(&rel);
                    self.fresh.remove(&rel);
                    self.dispatch(&rel, ChangeKind::Removed).await;
                }
                _ => {}
            }
        }
    }

    /// Decide what a debounced path settled into.
    fn settled_kind(&mut self, rel: &Path) -> ChangeKind {
        if !self.workspace_root.join(rel).exists() {
            // Rename-as-modify: the path vanished while debouncing
            self.fresh.remove(rel);
            return ChangeKind::Removed;
        }
        if self.fresh.remove(rel) {
            ChangeKind::Added
        } else {
            ChangeKind::Changed
        }
    }

    /// Deliver one settled event to every ready scope that covers the path.
    async fn dispatch(&mut self, rel: &Path, kind: ChangeKind) {
        let mut actions = Vec::new();
        for entry in &self.scopes {
            if !should_deliver(entry.state) || !entry.handler.matches(rel) {
                continue;
            }

            let verb = match kind {
                ChangeKind::Added => "added",
                ChangeKind::Changed => "modified",
                ChangeKind::Removed => "deleted",
            };
            crate::log_event!(entry.handler.name(), verb, "{}", rel.display());

            match entry.handler.route(rel, kind).await {
                Ok(action) => actions.push((entry.handler.name().to_string(), action)),
                Err(e) => {
                    tracing::error!("[{}] scope error: {e}", entry.handler.name());
                }
            }
        }
        for (name, action) in actions {
            self.execute_action(&name, action).await;
        }
    }

    /// Execute an action returned by a scope. Failures are logged, never
    /// fatal, and never stop the watcher.
    async fn execute_action(&self, scope: &str, action: RouteAction) {
        match action {
            RouteAction::IndexPaths(paths) => {
                let mut index = self.index.write().await;
                if let Err(e) = index.index_by_paths(&paths) {
                    tracing::error!("[{scope}] index update failed: {e}");
                }
            }
            RouteAction::DeletePaths(paths) => {
                let mut index = self.index.write().await;
                if let Err(e) = index.delete_by_paths(&paths) {
                    tracing::error!("[{scope}] index delete failed: {e}");
                }
            }
            RouteAction::RegenerateCodegen => {
                self.reconciler.regenerate_codegen().await;
            }
            RouteAction::None => {
                crate::debug_event!(scope, "no action needed");
            }
        }
    }
}

/// Check whether any generated-output marker appears as a consecutive
/// component run in the given path. Marker hits are dropped unconditionally
/// so the writer's own output never re-triggers routing.
pub fn path_contains_marker(rel: &Path, markers: &[String]) -> bool {
    let components: Vec<&str> = rel
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    markers.iter().any(|marker| {
        let needle: Vec<&str> = marker.split('/').collect();
        if needle.is_empty() || needle.len() > components.len() {
            return false;
        }
        components.windows(needle.len()).any(|w| w == needle)
    })
}

/// Builder for constructing a [`WatchRouter`].
pub struct WatchRouterBuilder {
    scopes: Vec<Box<dyn ScopeHandler>>,
    reconciler: Option<Arc<Reconciler>>,
    index: Option<Arc<RwLock<ContentIndex>>>,
    workspace_root: Option<PathBuf>,
    markers: Vec<String>,
    debounce_ms: u64,
    settle_ms: u64,
}

impl WatchRouterBuilder {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            reconciler: None,
            index: None,
            workspace_root: None,
            markers: Vec::new(),
            debounce_ms: 500,
            settle_ms: 250,
        }
    }

    /// Add a watch scope.
    pub fn scope(mut self, handler: impl ScopeHandler + 'static) -> Self {
        self.scopes.push(Box::new(handler));
        self
    }

    pub fn reconciler(mut self, reconciler: Arc<Reconciler>) -> Self {
        self.reconciler = Some(reconciler);
        self
    }

    pub fn index(mut self, index: Arc<RwLock<ContentIndex>>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn workspace_root(mut self, path: PathBuf) -> Self {
        self.workspace_root = Some(path);
        self
    }

    /// Set the generated-output markers whose events are always dropped.
    pub fn suppression_markers(mut self, markers: Vec<String>) -> Self {
        self.markers = markers;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Length of the quiet window that separates scan backfill from live
    /// edits.
    pub fn settle_ms(mut self, ms: u64) -> Self {
        self.settle_ms = ms;
        self
    }

    pub fn build(self) -> Result<WatchRouter, WatchError> {
        let reconciler = self.reconciler.ok_or_else(|| WatchError::Setup {
            reason: "Reconciler is required".to_string(),
        })?;
        let index = self.index.ok_or_else(|| WatchError::Setup {
            reason: "Content index is required".to_string(),
        })?;
        let workspace_root = self.workspace_root.ok_or_else(|| WatchError::Setup {
            reason: "Workspace root is required".to_string(),
        })?;

        let (tx, rx) = mpsc::channel(100);
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        Ok(WatchRouter {
            scopes: self
                .scopes
                .into_iter()
                .map(|handler| ScopeEntry {
                    handler,
                    state: ScopeState::Scanning,
                })
                .collect(),
            debouncer: Debouncer::new(self.debounce_ms),
            event_rx: rx,
            _watcher: watcher,
            reconciler,
            index,
            workspace_root,
            markers: self.markers,
            settle: Duration::from_millis(self.settle_ms),
            fresh: HashSet::new(),
        })
    }
}

impl Default for WatchRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
