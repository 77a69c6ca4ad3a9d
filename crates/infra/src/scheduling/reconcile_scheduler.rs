//! Interval scheduler for provider reconcile passes.

use std::sync::Arc;
use std::time::Duration;

use bodylog_domain::constants::DEFAULT_RECONCILE_INTERVAL_SECS;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::provider::ProviderReconciler;
use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the reconcile scheduler
#[derive(Debug, Clone)]
pub struct ReconcileSchedulerConfig {
    /// Interval between reconcile passes
    pub interval: Duration,
    /// Timeout for a single pass
    pub pass_timeout: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for ReconcileSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            pass_timeout: Duration::from_secs(120),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Periodic reconcile scheduler with explicit lifecycle management.
pub struct ReconcileScheduler {
    reconciler: Arc<ProviderReconciler>,
    config: ReconcileSchedulerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl ReconcileScheduler {
    /// Create a new scheduler over the given reconciler.
    pub fn new(reconciler: Arc<ProviderReconciler>, config: ReconcileSchedulerConfig) -> Self {
        Self { reconciler, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Start the scheduler, spawning the background reconcile loop.
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting reconcile scheduler");

        self.cancellation = CancellationToken::new();
        let reconciler = Arc::clone(&self.reconciler);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::reconcile_loop(reconciler, config, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("Reconcile scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the reconcile loop to finish.
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping reconcile scheduler");

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Reconcile loop panicked: {}", e);
                    return Err(SchedulerError::TaskJoinFailed(e.to_string()));
                }
                Err(_) => {
                    warn!("Reconcile loop did not complete within timeout");
                    return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() });
                }
            }
        }

        info!("Reconcile scheduler stopped");
        Ok(())
    }

    /// Returns true when the scheduler loop is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    async fn reconcile_loop(
        reconciler: Arc<ProviderReconciler>,
        config: ReconcileSchedulerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Reconcile loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.interval) => {
                    match tokio::time::timeout(config.pass_timeout, reconciler.reconcile()).await {
                        Ok(Ok(())) => debug!("Reconcile pass completed"),
                        Ok(Err(e)) => error!(error = %e, "Reconcile pass failed"),
                        Err(_) => warn!(
                            timeout_secs = config.pass_timeout.as_secs(),
                            "Reconcile pass timed out"
                        ),
                    }
                }
            }
        }
    }
}

impl Drop for ReconcileScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("ReconcileScheduler dropped while running; cancelling");
            self.cancellation.cancel();
        }
    }
}
