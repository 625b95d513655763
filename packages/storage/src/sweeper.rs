// ABOUTME: Background task that purges expired app settings on a fixed interval
// ABOUTME: Publishes every removed entry on a broadcast channel so callers can notify upstream

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use watchstore_core::AppSettingsView;

use crate::{SettingsStorage, StorageResult};

/// Capacity of the expired-entry broadcast channel
const EXPIRED_CHANNEL_SIZE: usize = 256;

/// Periodic sweeper for expired app settings.
///
/// Each cycle calls [`SettingsStorage::remove_expired_app_settings`] and sends
/// the removed views to every subscriber. A failed cycle is logged and the
/// next tick tries again. Dropping the sweeper stops the task as well, but
/// [`ExpirySweeper::shutdown`] waits for it to finish.
pub struct ExpirySweeper {
    storage: Arc<dyn SettingsStorage>,
    expired_tx: broadcast::Sender<AppSettingsView>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawn the sweep loop on the current tokio runtime.
    pub fn spawn(storage: Arc<dyn SettingsStorage>, period: Duration) -> Self {
        let (expired_tx, _) = broadcast::channel(EXPIRED_CHANNEL_SIZE);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(sweep_loop(
            storage.clone(),
            period,
            expired_tx.clone(),
            shutdown_rx,
        ));

        Self {
            storage,
            expired_tx,
            shutdown_tx,
            handle,
        }
    }

    /// Receive app settings as they are swept
    pub fn subscribe(&self) -> broadcast::Receiver<AppSettingsView> {
        self.expired_tx.subscribe()
    }

    /// Run one sweep right away, publishing and returning what it removed.
    pub async fn sweep_now(&self) -> StorageResult<Vec<AppSettingsView>> {
        sweep_once(self.storage.as_ref(), &self.expired_tx).await
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        // Receiver already gone means the loop has exited
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!("Expiry sweeper task failed: {}", e);
        }
        info!("Stopped app settings expiry sweeper");
    }
}

async fn sweep_loop(
    storage: Arc<dyn SettingsStorage>,
    period: Duration,
    expired_tx: broadcast::Sender<AppSettingsView>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // First sweep one full period after start
    let start = tokio::time::Instant::now() + period;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!(
        "Started app settings expiry sweeper (interval: {} seconds)",
        period.as_secs_f64()
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = sweep_once(storage.as_ref(), &expired_tx).await {
                    error!("Error during app settings sweep: {}", e);
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown");
                    break;
                }
            }
        }
    }
}

async fn sweep_once(
    storage: &dyn SettingsStorage,
    expired_tx: &broadcast::Sender<AppSettingsView>,
) -> StorageResult<Vec<AppSettingsView>> {
    let expired = storage.remove_expired_app_settings().await?;

    if !expired.is_empty() {
        info!("Swept {} expired app settings", expired.len());
    }

    for view in &expired {
        // No subscribers is the normal case when nobody listens for expiry
        if expired_tx.send(view.clone()).is_err() && expired_tx.receiver_count() > 0 {
            warn!("Failed to publish expired app settings for {}", view.user_key);
        }
    }

    Ok(expired)
}
