//! Durable sync queue service and drainer
//!
//! Implements the core `OutboxQueue` port on top of the SQLite outbox.
//! Enqueued operations are persisted first, then delivered sequentially in
//! enqueue order by a single drain at a time. A failed delivery stops the
//! drain and schedules the operation's next attempt with exponential
//! backoff; the attempt ceiling abandons the operation so one poisoned
//! entry cannot block the queue forever. Rejections count against the
//! same ceiling as transport failures.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use bodylog_core::{EntryStore, OutboxQueue, OutboxRepository, SyncState};
use bodylog_domain::constants::{BACKOFF_BASE_MS, BACKOFF_CAP_MS, MAX_SYNC_ATTEMPTS};
use bodylog_domain::{OperationKind, Result as DomainResult, SyncOperation, SyncStatus};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backend_client::BackendApi;
use super::errors::SyncError;

/// Configuration for the sync queue service.
#[derive(Debug, Clone)]
pub struct SyncQueueConfig {
    /// Failed attempt ceiling; operations at the ceiling are abandoned
    pub max_attempts: u32,
    /// Timeout for a full drain pass
    pub drain_timeout: Duration,
}

impl Default for SyncQueueConfig {
    fn default() -> Self {
        Self { max_attempts: MAX_SYNC_ATTEMPTS, drain_timeout: Duration::from_secs(300) }
    }
}

struct Inner {
    repo: Arc<dyn OutboxRepository>,
    backend: Arc<dyn BackendApi>,
    state: Arc<SyncState>,
    store: OnceLock<Arc<EntryStore>>,
    drain_lock: Mutex<()>,
    config: SyncQueueConfig,
}

/// Durable sync queue with a sequential drainer.
#[derive(Clone)]
pub struct SyncQueueService {
    inner: Arc<Inner>,
}

impl SyncQueueService {
    /// Create a new queue service over the given storage and backend.
    pub fn new(
        repo: Arc<dyn OutboxRepository>,
        backend: Arc<dyn BackendApi>,
        state: Arc<SyncState>,
        config: SyncQueueConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                backend,
                state,
                store: OnceLock::new(),
                drain_lock: Mutex::new(()),
                config,
            }),
        }
    }

    /// Attach the entry store so delivered creates can record their
    /// backend-assigned ids. Set once during wiring.
    pub fn attach_store(&self, store: Arc<EntryStore>) {
        if self.inner.store.set(store).is_err() {
            warn!("entry store already attached to sync queue");
        }
    }

    /// Record a connectivity change. Going online starts a drain.
    pub fn handle_connectivity(&self, online: bool) {
        let was_online = self.inner.state.is_online();
        self.inner.state.set_online(online);
        if online && !was_online {
            info!("connectivity restored, draining sync queue");
            self.spawn_drain();
        }
    }

    /// Drain the queue now, waiting for completion. A drain already in
    /// progress makes this a no-op.
    pub async fn force_sync(&self) {
        self.drain().await;
    }

    /// Refresh the pending-operations gauge from storage. Called during
    /// startup so the count survives restarts.
    pub async fn refresh_pending_gauge(&self) {
        match self.inner.repo.pending_count().await {
            Ok(count) => self.inner.state.set_pending_operations(count),
            Err(err) => warn!(error = %err, "failed to read pending operation count"),
        }
    }

    fn spawn_drain(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            service.drain().await;
        });
    }

    /// Run one drain pass. Guarded so at most one drain runs at a time.
    async fn drain(&self) {
        let Ok(_guard) = self.inner.drain_lock.try_lock() else {
            debug!("drain already in progress");
            return;
        };
        if !self.inner.state.is_online() {
            debug!("offline, skipping drain");
            return;
        }

        self.inner.state.set_last_sync_status(SyncStatus::InProgress);
        if let Err(err) =
            tokio::time::timeout(self.inner.config.drain_timeout, self.drain_pass()).await
        {
            warn!(error = %err, "drain pass timed out");
        }
        self.refresh_pending_gauge().await;
        self.inner.state.set_last_sync_status(SyncStatus::Completed);
    }

    /// Deliver due operations oldest-first. Stops at the first failed
    /// delivery so later operations never overtake an earlier one.
    async fn drain_pass(&self) {
        loop {
            if !self.inner.state.is_online() {
                debug!("went offline mid-drain, stopping");
                return;
            }

            let now = Utc::now().timestamp();
            let due = match self.inner.repo.due_operations(now).await {
                Ok(due) => due,
                Err(err) => {
                    warn!(error = %err, "failed to read due operations");
                    return;
                }
            };
            if due.is_empty() {
                debug!("sync queue drained");
                return;
            }

            info!(count = due.len(), "draining sync operations");

            for op in due {
                match self.deliver(&op).await {
                    Ok(()) => {
                        debug!(op_id = %op.id, kind = %op.kind, "operation delivered");
                        self.complete(&op).await;
                    }
                    Err(err) => {
                        if self.handle_failure(&op, &err).await {
                            // Below the ceiling; the next attempt runs
                            // after the backoff window.
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn deliver(&self, op: &SyncOperation) -> Result<(), SyncError> {
        match op.kind {
            OperationKind::Create => {
                let backend_id = self.inner.backend.create_entry(&op.snapshot).await?;
                if let Some(store) = self.inner.store.get() {
                    store.associate_backend_id(op.snapshot.entry_id, backend_id).await;
                }
                Ok(())
            }
            OperationKind::Update => self.inner.backend.update_entry(&op.snapshot).await,
            OperationKind::Delete => self.inner.backend.delete_entry(&op.snapshot).await,
        }
    }

    async fn complete(&self, op: &SyncOperation) {
        if let Err(err) = self.inner.repo.remove(op.id).await {
            warn!(op_id = %op.id, error = %err, "failed to remove delivered operation");
        }
    }

    /// Record a failed attempt. Returns true when the drain should stop
    /// and wait for the retry window. Every failure counts against the
    /// attempt ceiling, rejections included.
    async fn handle_failure(&self, op: &SyncOperation, err: &SyncError) -> bool {
        let attempts = op.attempts + 1;

        if attempts >= self.inner.config.max_attempts {
            warn!(
                op_id = %op.id,
                attempts,
                error = %err,
                "operation reached attempt ceiling, abandoning"
            );
            self.complete(op).await;
            return false;
        }

        let delay_ms = calculate_backoff(op.attempts);
        let next_attempt_at = Utc::now().timestamp() + i64::try_from(delay_ms / 1_000).unwrap_or(1).max(1);
        warn!(
            op_id = %op.id,
            attempts,
            delay_ms,
            category = ?err.category(),
            error = %err,
            "operation failed, scheduling retry"
        );

        if let Err(record_err) =
            self.inner.repo.record_failure(op.id, attempts, next_attempt_at, &err.to_string()).await
        {
            warn!(op_id = %op.id, error = %record_err, "failed to record attempt");
        }
        true
    }
}

#[async_trait]
impl OutboxQueue for SyncQueueService {
    async fn enqueue(&self, op: SyncOperation) -> DomainResult<()> {
        self.inner.repo.insert(&op).await?;
        self.refresh_pending_gauge().await;

        if self.inner.state.is_online() {
            self.spawn_drain();
        }
        Ok(())
    }
}

/// Exponential backoff with jitter for retry scheduling.
pub fn calculate_backoff(attempt: u32) -> u64 {
    let delay = BACKOFF_BASE_MS * 2u64.pow(attempt.min(5));
    let capped_delay = delay.min(BACKOFF_CAP_MS);

    // Add +-25% jitter
    use rand::Rng;
    let jitter_range = (capped_delay as f64 * 0.25) as u64;
    let mut rng = rand::thread_rng();
    let jitter = rng.gen_range(0..=jitter_range * 2) as i64 - jitter_range as i64;

    (capped_delay as i64 + jitter).max(0) as u64
}
