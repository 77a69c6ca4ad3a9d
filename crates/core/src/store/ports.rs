//! Port interfaces for entry persistence

use async_trait::async_trait;
use bodylog_domain::{MeasurementEntry, Result};

/// Trait for persisting the full measurement entry collection.
///
/// The entry set is persisted wholesale: the in-memory collection is the
/// source of truth for the running process and storage is reconciled on the
/// next successful write.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Load the persisted entry set at process start
    async fn load_all(&self) -> Result<Vec<MeasurementEntry>>;

    /// Replace the persisted entry set with the given collection
    async fn replace_all(&self, entries: &[MeasurementEntry]) -> Result<()>;
}
