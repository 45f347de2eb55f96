//! Background sweep for expired cache entries
//!
//! The sweeper only holds a `Weak` reference, so dropping the last `Arc` to
//! the cache ends the task on its next tick.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use super::store::ResponseCache;
use crate::{Error, Result};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Longer periods would overflow the timer deadline
const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodic task that purges expired cache entries
#[derive(Debug)]
pub struct CacheSweeper {
    interval: Duration,
    shutdown: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl CacheSweeper {
    /// Spawn on the current tokio runtime.
    ///
    /// Fails with `Error::Internal` when called outside a runtime.
    pub fn start(cache: &Arc<ResponseCache>, interval: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Internal(format!("Cache sweeper needs a tokio runtime: {}", e)))?;
        Ok(Self::start_on(&runtime, cache, interval))
    }

    pub fn start_on(runtime: &Handle, cache: &Arc<ResponseCache>, interval: Duration) -> Self {
        let interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        let cache: Weak<ResponseCache> = Arc::downgrade(cache);
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else {
                            debug!("Cache dropped, stopping sweeper");
                            break;
                        };

                        let removed = cache.purge_expired();
                        if removed > 0 {
                            debug!(removed, remaining = cache.len(), "Swept expired cache entries");
                        } else {
                            trace!("Cache sweep found nothing expired");
                        }
                    }
                    _ = signal.notified() => {
                        debug!("Cache sweeper shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            interval,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the task and wait for it to exit
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(handle) = self.handle.take() {
            // A cancelled or panicked sweep has nothing left to clean up
            let _ = handle.await;
        }
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
