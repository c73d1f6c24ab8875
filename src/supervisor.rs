//! Lifecycle supervisor for the optional dev sub-command.
//!
//! Owns at most one child process per dev session and guarantees it is
//! terminated exactly once, no matter which termination trigger fires first:
//! normal exit, interrupt, or one of the user-facing signals.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::{SyncError, SyncResult};
use crate::log_event;

/// Supervises the configured sub-command for the lifetime of a dev session.
pub struct Supervisor {
    child: Mutex<Option<Child>>,
    terminated: AtomicBool,
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            child: Mutex::new(None),
            terminated: AtomicBool::new(false),
        }
    }

    /// Spawn the sub-command through the shell.
    ///
    /// `kill_on_drop` backstops the explicit shutdown path for uncaught
    /// faults that unwind past it.
    pub async fn start(&self, command: &str) -> SyncResult<()> {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SyncError::Subprocess {
                reason: format!("failed to start '{command}': {e}"),
            })?;

        log_event!("supervisor", "started", "{command}");
        *self.child.lock().await = Some(child);
        Ok(())
    }

    /// Terminate the child, if any. Idempotent: whichever termination
    /// trigger fires first wins, later calls are no-ops.
    pub async fn shutdown(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut slot = self.child.lock().await;
        if let Some(mut child) = slot.take() {
            match child.kill().await {
                Ok(()) => log_event!("supervisor", "stopped"),
                Err(e) => tracing::warn!("[supervisor] failed to stop sub-command: {e}"),
            }
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Block until any termination trigger fires: interrupt, the platform
/// terminate signal, or either user-defined signal.
pub async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("[supervisor] cannot listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        let mut usr1 = signal(SignalKind::user_defined1()).ok();
        let mut usr2 = signal(SignalKind::user_defined2()).ok();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log_event!("supervisor", "interrupted");
            }
            _ = term.recv() => {
                log_event!("supervisor", "terminated");
            }
            _ = async {
                match usr1.as_mut() {
                    Some(s) => { s.recv().await; }
                    None => std::future::pending().await,
                }
            } => {
                log_event!("supervisor", "signalled", "SIGUSR1");
            }
            _ = async {
                match usr2.as_mut() {
                    Some(s) => { s.recv().await; }
                    None => std::future::pending().await,
                }
            } => {
                log_event!("supervisor", "signalled", "SIGUSR2");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        log_event!("supervisor", "interrupted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let supervisor = Supervisor::new();
        supervisor.start("sleep 30").await.unwrap();

        supervisor.shutdown().await;
        supervisor.shutdown().await;
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_without_child_is_a_no_op() {
        let supervisor = Supervisor::new();
        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn start_after_shutdown_still_terminates_cleanly() {
        let supervisor = Supervisor::new();
        supervisor.start("sleep 30").await.unwrap();
        supervisor.shutdown().await;
        // A second session needs a fresh supervisor; this one stays dead
        supervisor.shutdown().await;
    }
}
