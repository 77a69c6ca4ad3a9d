//! Interval scheduler for periodic sync queue drains.
//!
//! Drains also start opportunistically on enqueue and on connectivity
//! changes; this scheduler is the safety net that retries operations whose
//! backoff window has elapsed while the app sat idle.

use std::time::Duration;

use bodylog_domain::constants::DEFAULT_DRAIN_INTERVAL_SECS;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};
use crate::sync::SyncQueueService;

/// Configuration for the drain scheduler
#[derive(Debug, Clone)]
pub struct DrainSchedulerConfig {
    /// Interval between drain attempts
    pub interval: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for DrainSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_DRAIN_INTERVAL_SECS),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Periodic drain scheduler with explicit lifecycle management.
pub struct DrainScheduler {
    queue: SyncQueueService,
    config: DrainSchedulerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl DrainScheduler {
    /// Create a new scheduler over the given queue service.
    pub fn new(queue: SyncQueueService, config: DrainSchedulerConfig) -> Self {
        Self { queue, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Start the scheduler, spawning the background drain loop.
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting drain scheduler");

        self.cancellation = CancellationToken::new();
        let queue = self.queue.clone();
        let interval = self.config.interval;
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::drain_loop(queue, interval, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("Drain scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the drain loop to finish.
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping drain scheduler");

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Drain loop panicked: {}", e);
                    return Err(SchedulerError::TaskJoinFailed(e.to_string()));
                }
                Err(_) => {
                    warn!("Drain loop did not complete within timeout");
                    return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() });
                }
            }
        }

        info!("Drain scheduler stopped");
        Ok(())
    }

    /// Returns true when the scheduler loop is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    async fn drain_loop(queue: SyncQueueService, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Drain loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    queue.force_sync().await;
                }
            }
        }
    }
}

impl Drop for DrainScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("DrainScheduler dropped while running; cancelling");
            self.cancellation.cancel();
        }
    }
}
