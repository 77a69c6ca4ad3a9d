//! Shared sync status observables
//!
//! Collaborators (UI, schedulers) observe connectivity and queue progress
//! through this handle instead of receiving blocking errors from local
//! mutations.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

use bodylog_domain::SyncStatus;

const STATUS_IDLE: u8 = 0;
const STATUS_IN_PROGRESS: u8 = 1;
const STATUS_COMPLETED: u8 = 2;

/// Observable sync state shared between the queue, schedulers, and callers.
#[derive(Debug, Default)]
pub struct SyncState {
    online: AtomicBool,
    pending: AtomicUsize,
    status: AtomicU8,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn pending_operations(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn set_pending_operations(&self, count: usize) {
        self.pending.store(count, Ordering::SeqCst);
    }

    pub fn last_sync_status(&self) -> SyncStatus {
        match self.status.load(Ordering::SeqCst) {
            STATUS_IN_PROGRESS => SyncStatus::InProgress,
            STATUS_COMPLETED => SyncStatus::Completed,
            _ => SyncStatus::Idle,
        }
    }

    pub fn set_last_sync_status(&self, status: SyncStatus) {
        let raw = match status {
            SyncStatus::Idle => STATUS_IDLE,
            SyncStatus::InProgress => STATUS_IN_PROGRESS,
            SyncStatus::Completed => STATUS_COMPLETED,
        };
        self.status.store(raw, Ordering::SeqCst);
    }
}
