//! Dev command: reconcile once, then stay resident watching for changes.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::error::SyncResult;
use crate::log_event;
use crate::reconcile::Reconciler;
use crate::supervisor::{Supervisor, wait_for_termination};
use crate::watcher::{ContentScope, QueryScope, WatchRouter};

pub struct DevOptions {
    pub port: u16,
    pub command: Option<String>,
    pub no_watch: bool,
    pub no_sdk: bool,
    /// Settings file the session was started from, when `--config` was given.
    pub config: Option<PathBuf>,
}

/// Run the dev session.
///
/// The initial reconcile is fatal on failure: with no prior good state
/// there is nothing to keep serving. Everything after it is resilient.
pub async fn run_dev(settings: Settings, opts: DevOptions) -> SyncResult<()> {
    let command = opts.command.clone().or_else(|| settings.dev.command.clone());
    let no_watch = opts.no_watch || settings.dev.no_watch;
    let no_sdk = opts.no_sdk || settings.dev.no_sdk;

    let reconciler = Reconciler::new(settings, opts.config.clone(), Some(opts.port), !no_sdk);
    reconciler.reconcile().await?;

    let supervisor = Arc::new(Supervisor::new());

    if no_watch {
        log_event!("dev", "watching disabled", "artifacts will not track file changes");
    } else {
        let snapshot = reconciler.snapshot().await;
        let root = snapshot.root();

        let mut builder = WatchRouter::builder()
            .scope(ContentScope::new(&snapshot.collections)?)
            .reconciler(Arc::clone(&reconciler))
            .index(reconciler.index())
            .workspace_root(root.clone())
            .suppression_markers(snapshot.suppression_markers())
            .debounce_ms(snapshot.file_watch.debounce_ms)
            .settle_ms(snapshot.file_watch.settle_ms);

        // Projects without a queries directory simply have no query scope
        if root.join(&snapshot.queries_path).is_dir() {
            builder = builder.scope(QueryScope::new(&snapshot.queries_path)?);
        }

        let mut router = builder.build()?;
        router.register()?;

        tokio::spawn(async move {
            if let Err(e) = router.run().await {
                tracing::error!("[dev] watcher stopped: {e}");
            }
        });
    }

    if let Some(command) = &command {
        if let Err(e) = supervisor.start(command).await {
            tracing::error!("[dev] {e}");
        }
    }

    log_event!("dev", "session up", "port {}", opts.port);

    wait_for_termination().await;
    supervisor.shutdown().await;
    Ok(())
}
