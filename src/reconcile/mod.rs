//! Full-reconcile orchestration.
//!
//! One reconcile pass takes the session from any starting state to a fully
//! consistent artifact set: settings are reloaded, the schema rebuilt, the
//! content index rebuilt against it, and the generated artifacts rewritten.
//! The sequence is strictly ordered and aborts on the first failure, leaving
//! whatever artifacts the previous pass produced in place.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::artifacts::ArtifactWriter;
use crate::codegen::{CodegenPipeline, collect_user_documents, resolve_api_url};
use crate::config::Settings;
use crate::error::SyncResult;
use crate::index::ContentIndex;
use crate::schema::SchemaBuilder;

/// Coalesces concurrent reconcile triggers into one running pass.
///
/// Triggers arriving while a pass is in flight set the pending flag; the
/// running pass picks it up and reruns with freshly loaded settings, so the
/// latest trigger always wins.
pub struct SingleFlight {
    running: AtomicBool,
    pending: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        }
    }

    /// Claim the flight. Returns a guard when no pass is running; otherwise
    /// records the trigger as pending and returns `None`.
    pub fn begin(&self) -> Option<FlightGuard<'_>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(FlightGuard { flight: self })
        } else {
            self.pending.store(true, Ordering::Release);
            None
        }
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the duration of one reconcile pass.
pub struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl FlightGuard<'_> {
    /// Consume a pending trigger, if any arrived mid-run.
    pub fn take_pending(&self) -> bool {
        self.flight.pending.swap(false, Ordering::AcqRel)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.running.store(false, Ordering::Release);
    }
}

/// Drives the full reconcile sequence and the cheaper codegen-only path.
///
/// Holds the last-known-good settings snapshot; a failed re-reconcile keeps
/// the previous snapshot and artifacts active.
pub struct Reconciler {
    settings_path: PathBuf,
    snapshot: RwLock<Arc<Settings>>,
    index: Arc<RwLock<ContentIndex>>,
    local_port: Option<u16>,
    generate_sdk: bool,
    flight: SingleFlight,
}

impl Reconciler {
    /// Build a reconciler around the session's settings.
    ///
    /// `config_path` is the file the settings were loaded from; reloads in
    /// later passes read the same file. When absent, the canonical
    /// `.contentsync/settings.toml` under the session root is used.
    pub fn new(
        settings: Settings,
        config_path: Option<PathBuf>,
        local_port: Option<u16>,
        generate_sdk: bool,
    ) -> Arc<Self> {
        let index = Arc::new(RwLock::new(ContentIndex::open(
            settings.root(),
            settings.index_dir(),
        )));
        Arc::new(Self {
            settings_path: config_path.unwrap_or_else(|| settings.settings_path()),
            snapshot: RwLock::new(Arc::new(settings)),
            index,
            local_port,
            generate_sdk,
            flight: SingleFlight::new(),
        })
    }

    /// Shared handle to the content index for path-scoped routing.
    pub fn index(&self) -> Arc<RwLock<ContentIndex>> {
        Arc::clone(&self.index)
    }

    /// Last successfully reconciled settings.
    pub async fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Run one full reconcile pass.
    ///
    /// Ordered: load settings, build schema, persist the manifest, rebuild
    /// the content index against the new schema, run codegen, write the
    /// remaining artifacts. The first failure aborts the rest; the settings
    /// snapshot only advances after the whole pass lands.
    pub async fn reconcile(&self) -> SyncResult<()> {
        let previous = self.snapshot().await;

        let mut settings = Settings::load_from(&self.settings_path)?;
        // The resolved root is a session invariant. The loader's fallback
        // walks up from the current directory, which may sit inside a
        // different workspace than the one this session was started for.
        settings.root_path = Some(previous.root());

        let schema = SchemaBuilder::build(&settings)?;

        let writer = ArtifactWriter::new(settings.generated_dir());
        if !settings.legacy_layout {
            writer.write_manifest(&schema)?;
        }

        {
            // Exclusive for the whole rebuild so path-scoped updates never
            // interleave with it
            let mut index = self.index.write().await;
            let stats = index.full_index(&schema)?;
            crate::log_event!(
                "reconcile",
                "indexed",
                "{} documents in {} collections",
                stats.documents,
                stats.collections
            );
        }

        let output = if self.generate_sdk {
            let api_url = resolve_api_url(&settings.api, self.local_port)?;
            let docs = collect_user_documents(&settings.root(), &settings.queries_path)?;
            Some(CodegenPipeline::generate(
                &schema,
                &docs,
                &api_url,
                settings.output_mode,
            )?)
        } else {
            None
        };

        writer.write_schema_docs(&schema)?;
        if let Some(output) = &output {
            writer.write_codegen(output, settings.output_mode)?;
            writer.write_static()?;
        }

        *self.snapshot.write().await = Arc::new(settings);
        crate::log_event!("reconcile", "complete");
        Ok(())
    }

    /// Single-flight entry point for re-reconciles during a live session.
    ///
    /// Failures are reported and swallowed; the session keeps serving the
    /// last-known-good artifacts.
    pub async fn trigger(&self) {
        let Some(guard) = self.flight.begin() else {
            crate::debug_event!("reconcile", "coalesced into running pass");
            return;
        };

        loop {
            if let Err(e) = self.reconcile().await {
                tracing::error!("[reconcile] failed, keeping previous artifacts: {e}");
            }
            if !guard.take_pending() {
                break;
            }
            crate::log_event!("reconcile", "rerunning", "trigger arrived mid-pass");
        }
    }

    /// Codegen-only regeneration for query-document edits.
    ///
    /// Re-derives the schema artifact from the current snapshot (the base
    /// schema is a function of settings alone, so this is cheap and cannot
    /// drift), re-collects query documents, and rewrites the codegen
    /// artifacts. The content index is not touched.
    pub async fn regenerate_codegen(&self) {
        if let Err(e) = self.regenerate_codegen_inner().await {
            tracing::error!("[codegen] regeneration failed, keeping previous artifacts: {e}");
        }
    }

    async fn regenerate_codegen_inner(&self) -> SyncResult<()> {
        let settings = self.snapshot().await;
        let schema = SchemaBuilder::build(&settings)?;
        let writer = ArtifactWriter::new(settings.generated_dir());

        writer.write_schema_docs(&schema)?;

        if self.generate_sdk {
            let api_url = resolve_api_url(&settings.api, self.local_port)?;
            let docs = collect_user_documents(&settings.root(), &settings.queries_path)?;
            let output =
                CodegenPipeline::generate(&schema, &docs, &api_url, settings.output_mode)?;
            writer.write_codegen(&output, settings.output_mode)?;
        }

        crate::log_event!("codegen", "regenerated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_flight_claims_once() {
        let flight = SingleFlight::new();

        let guard = flight.begin().expect("first claim succeeds");
        assert!(flight.begin().is_none());

        // The blocked trigger left a pending mark for the running pass
        assert!(guard.take_pending());
        assert!(!guard.take_pending());
    }

    #[test]
    fn dropping_the_guard_releases_the_flight() {
        let flight = SingleFlight::new();
        drop(flight.begin().expect("first claim succeeds"));
        assert!(flight.begin().is_some());
    }

    #[test]
    fn pending_survives_until_taken() {
        let flight = SingleFlight::new();
        let guard = flight.begin().unwrap();
        assert!(flight.begin().is_none());
        assert!(flight.begin().is_none());
        // Two coalesced triggers collapse into one pending rerun
        assert!(guard.take_pending());
        assert!(!guard.take_pending());
    }
}
