//! Expired Entry Sweeper
//!
//! Background task that periodically removes entries whose TTL has elapsed.
//! Reads already hide expired entries, so the sweeper only reclaims storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;

// == Sweep Target ==
/// Storage that can physically drop its expired entries.
#[async_trait]
pub trait Sweep: Send + Sync + 'static {
    /// Removes up to `limit` expired entries (0 = no limit), oldest first.
    ///
    /// Returns the number of entries removed.
    async fn sweep_expired(&self, limit: usize) -> Result<u64>;

    /// Backend identity used in log lines
    fn backend_name(&self) -> &'static str;
}

// == Sweeper ==
/// Handle on a store's background sweep task.
///
/// The task is bound to the store's lifetime: `stop` signals it and waits for
/// it to finish, and dropping the handle signals it without waiting.
#[derive(Debug)]
pub struct Sweeper {
    shutdown_tx: Option<watch::Sender<bool>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Sweeper {
    /// Spawns the sweep loop for `target`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    pub fn spawn<S: Sweep>(target: Arc<S>, interval: Duration, batch_size: usize) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_sweeps(target, interval, batch_size, shutdown_rx));

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Mutex::new(Some(handle)),
        }
    }

    /// A sweeper that never runs, for stores with background sweeping off.
    pub fn disabled() -> Self {
        Self {
            shutdown_tx: None,
            handle: Mutex::new(None),
        }
    }

    /// Spawns the loop only when `interval` is non-zero.
    pub fn start<S: Sweep>(target: Arc<S>, interval: Duration, batch_size: usize) -> Self {
        if interval.is_zero() {
            Self::disabled()
        } else {
            Self::spawn(target, interval, batch_size)
        }
    }

    // == Stop ==
    /// Signals the task to stop and waits for it to exit.
    ///
    /// Safe to call more than once.
    pub async fn stop(&self) {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(true);
        }

        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Sweep task ended abnormally: {}", e);
            }
        }
    }

    /// Returns true while the sweep task is alive.
    pub async fn is_running(&self) -> bool {
        match self.handle.lock().await.as_ref() {
            Some(handle) => !handle.is_finished(),
            None => false,
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(true);
        }
    }
}

// == Sweep Loop ==
async fn run_sweeps<S: Sweep>(
    target: Arc<S>,
    interval: Duration,
    batch_size: usize,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(
        "Starting {} sweep task with interval of {:?}",
        target.backend_name(),
        interval
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately; sweeps start one interval in
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match target.sweep_expired(batch_size).await {
                    Ok(0) => debug!("{} sweep: no expired entries found", target.backend_name()),
                    Ok(removed) => info!("{} sweep: removed {} expired entries", target.backend_name(), removed),
                    // retried on the next tick
                    Err(e) => warn!("{} sweep failed: {}", target.backend_name(), e),
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    debug!("{} sweep task stopped", target.backend_name());
}
