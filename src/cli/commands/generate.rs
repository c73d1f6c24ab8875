//! Generate command: one full reconcile, no resident session.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::SyncResult;
use crate::reconcile::Reconciler;

/// Run one full reconcile and exit.
///
/// No local port is involved, so the generated client points at the
/// configured override or hosted endpoint.
pub async fn run_generate(
    settings: Settings,
    config: Option<PathBuf>,
    no_sdk: bool,
) -> SyncResult<()> {
    let reconciler = Reconciler::new(settings, config, None, !no_sdk);
    reconciler.reconcile().await
}
