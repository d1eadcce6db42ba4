//! Background expiry sweep

use campusgate_core::SessionStore;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

/// Handle for the background sweep task
pub struct SweepTask {
    shutdown_tx: tokio::sync::mpsc::Sender<()>,
}

impl SweepTask {
    /// Signal the sweep task to shutdown gracefully
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Spawn a task that removes expired sessions every `interval`.
///
/// After each cycle `on_sweep` receives the number of sessions removed and
/// the number still held.
pub fn spawn_sweep_task<F>(
    store: Arc<dyn SessionStore>,
    interval: Duration,
    on_sweep: F,
) -> SweepTask
where
    F: Fn(usize, usize) + Send + Sync + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    tokio::spawn(async move {
        tracing::info!("Starting session sweep task (interval: {}s)", interval.as_secs());

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Session sweep task shutting down");
                    break;
                }
                _ = sleep(interval) => {
                    let removed = store.sweep_expired().await;
                    if removed > 0 {
                        tracing::debug!("Sweep cycle removed {} sessions", removed);
                    }
                    on_sweep(removed, store.active_sessions().await);
                }
            }
        }
    });

    SweepTask { shutdown_tx }
}
