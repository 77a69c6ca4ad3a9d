//! Port interfaces for sync operations

use async_trait::async_trait;
use bodylog_domain::{Result, SyncOperation};
use uuid::Uuid;

/// Trait for submitting operations to the sync queue.
///
/// Implementations persist the operation durably and may opportunistically
/// start a drain when connectivity is available.
#[async_trait]
pub trait OutboxQueue: Send + Sync {
    /// Enqueue a remote mutation for eventual delivery
    async fn enqueue(&self, op: SyncOperation) -> Result<()>;
}

/// Trait for durable sync operation storage with retry bookkeeping
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Persist a new operation
    async fn insert(&self, op: &SyncOperation) -> Result<()>;

    /// Pending operations whose `next_attempt_at` is at or before `now`,
    /// ordered by ascending `created_at`
    async fn due_operations(&self, now: i64) -> Result<Vec<SyncOperation>>;

    /// Remove an operation (delivered or abandoned)
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Record a failed attempt with the retry window for the next one
    async fn record_failure(
        &self,
        id: Uuid,
        attempts: u32,
        next_attempt_at: i64,
        error: &str,
    ) -> Result<()>;

    /// Number of operations still pending delivery
    async fn pending_count(&self) -> Result<usize>;
}
