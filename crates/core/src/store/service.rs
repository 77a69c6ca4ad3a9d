//! Entry store - core business logic
//!
//! Owns the measurement entry collection. All mutation funnels through one
//! internal async mutex, so the single-writer invariant is structural rather
//! than caller discipline. Callers see always-succeeding local mutation:
//! persistence failures are logged and reconciled by the next successful
//! write, and backend/provider discrepancies surface only through the sync
//! status observables.

use std::sync::Arc;

use bodylog_domain::constants::RELEVANT_KINDS;
use bodylog_domain::{
    EntrySource, MeasurementEntry, MeasurementType, OperationKind, SyncOperation,
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics::recompute_derived;
use crate::provider::ports::ProviderPush;
use crate::store::ports::EntryRepository;
use crate::sync::ports::OutboxQueue;

/// Measurement entry store
pub struct EntryStore {
    entries: Mutex<Vec<MeasurementEntry>>,
    repository: Arc<dyn EntryRepository>,
    outbox: Arc<dyn OutboxQueue>,
    provider_push: Option<Arc<dyn ProviderPush>>,
}

impl EntryStore {
    /// Create a new entry store
    pub fn new(repository: Arc<dyn EntryRepository>, outbox: Arc<dyn OutboxQueue>) -> Self {
        Self { entries: Mutex::new(Vec::new()), repository, outbox, provider_push: None }
    }

    /// Attach the best-effort local-to-provider push path.
    ///
    /// When set, manual entry creation and updates are mirrored to the
    /// external provider, fire-and-forget.
    pub fn with_provider_push(mut self, push: Arc<dyn ProviderPush>) -> Self {
        self.provider_push = Some(push);
        self
    }

    /// Load the persisted entry set and run one full derived recalculation
    /// pass. Handles schema drift or stale derived data left by a previous
    /// version.
    pub async fn load(&self) -> bodylog_domain::Result<()> {
        let loaded = self.repository.load_all().await?;

        let mut entries = self.entries.lock().await;
        *entries = loaded;
        Self::apply_recalculation(&mut entries);
        sort_newest_first(&mut entries);
        debug!(count = entries.len(), "entry store loaded");

        self.persist(&entries).await;
        Ok(())
    }

    /// Add an entry, replacing any existing entry with the same
    /// (calendar day, kind, source) key.
    ///
    /// Replacement keeps the existing entry's `id` and `backend_id`, so the
    /// id-immutability invariant holds across replaces. Re-adding an
    /// identical entry is a no-op, which makes provider re-imports
    /// idempotent. Non-derived entries enqueue a `create` sync operation,
    /// or an `update` when the replaced entry already reached the backend.
    pub async fn add(&self, mut entry: MeasurementEntry) {
        if Self::reject_derived_mutation(&entry, "add") {
            return;
        }

        let mut entries = self.entries.lock().await;
        let mut op_kind = OperationKind::Create;

        if let Some(existing) = entries.iter_mut().find(|e| e.day_key() == entry.day_key()) {
            if existing.value == entry.value && existing.date == entry.date {
                debug!(kind = %entry.kind, "identical entry already present, skipping");
                return;
            }
            entry.id = existing.id;
            entry.backend_id = existing.backend_id.clone();
            if entry.backend_id.is_some() {
                op_kind = OperationKind::Update;
            }
            *existing = entry.clone();
        } else {
            entries.push(entry.clone());
        }

        if entry.kind.triggers_recalculation() {
            Self::apply_recalculation(&mut entries);
        }
        sort_newest_first(&mut entries);

        self.persist(&entries).await;
        self.enqueue(op_kind, &entry).await;
        drop(entries);

        self.mirror_to_provider(&entry);
    }

    /// Update an entry located by `id`, replacing its value and date.
    /// A missing id is a no-op.
    pub async fn update(&self, entry: MeasurementEntry) {
        if Self::reject_derived_mutation(&entry, "update") {
            return;
        }

        let mut entries = self.entries.lock().await;

        let Some(existing) = entries.iter_mut().find(|e| e.id == entry.id) else {
            debug!(entry_id = %entry.id, "update for unknown entry, ignoring");
            return;
        };
        existing.value = entry.value;
        existing.date = entry.date;
        let updated = existing.clone();

        if updated.kind.triggers_recalculation() {
            Self::apply_recalculation(&mut entries);
        }
        sort_newest_first(&mut entries);

        self.persist(&entries).await;
        self.enqueue(OperationKind::Update, &updated).await;
        drop(entries);

        self.mirror_to_provider(&updated);
    }

    /// Remove an entry by `id`. A missing id is a no-op. Non-derived
    /// entries enqueue a `delete` sync operation.
    pub async fn remove(&self, entry: &MeasurementEntry) {
        if Self::reject_derived_mutation(entry, "remove") {
            return;
        }

        let mut entries = self.entries.lock().await;

        let Some(index) = entries.iter().position(|e| e.id == entry.id) else {
            debug!(entry_id = %entry.id, "remove for unknown entry, ignoring");
            return;
        };
        let removed = entries.remove(index);

        if matches!(removed.kind, MeasurementType::Weight | MeasurementType::Height) {
            Self::apply_recalculation(&mut entries);
        }
        sort_newest_first(&mut entries);

        self.persist(&entries).await;
        self.enqueue(OperationKind::Delete, &removed).await;
    }

    /// Most recent entry of a kind, if any.
    pub async fn latest(&self, kind: MeasurementType) -> Option<MeasurementEntry> {
        let entries = self.entries.lock().await;
        entries.iter().filter(|e| e.kind == kind).max_by_key(|e| e.date).cloned()
    }

    /// All entries of a kind, optionally filtered by source, newest first.
    pub async fn entries_for_type(
        &self,
        kind: MeasurementType,
        source: Option<EntrySource>,
    ) -> Vec<MeasurementEntry> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter(|e| e.kind == kind && source.map_or(true, |s| e.source == s))
            .cloned()
            .collect()
    }

    /// For each relevant raw kind, the most recent entry with
    /// `date <= as_of`. Used to associate a historical measurement snapshot
    /// with a point in time.
    pub async fn entries_as_of(&self, as_of: DateTime<Utc>) -> Vec<MeasurementEntry> {
        let entries = self.entries.lock().await;
        RELEVANT_KINDS
            .iter()
            .filter_map(|kind| {
                entries
                    .iter()
                    .filter(|e| e.kind == *kind && e.date <= as_of)
                    .max_by_key(|e| e.date)
                    .cloned()
            })
            .collect()
    }

    /// Record the backend-assigned identifier after a successful create.
    /// The association happens at most once; later calls are ignored.
    pub async fn associate_backend_id(&self, entry_id: Uuid, backend_id: String) {
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.iter_mut().find(|e| e.id == entry_id) else {
            debug!(%entry_id, "backend id for unknown entry, ignoring");
            return;
        };
        if entry.backend_id.is_some() {
            return;
        }
        entry.backend_id = Some(backend_id);

        self.persist(&entries).await;
    }

    /// Wipe all local entries. Used on account sign-out.
    pub async fn clear_all(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries).await;
    }

    /// Snapshot of the full collection, newest first.
    pub async fn all_entries(&self) -> Vec<MeasurementEntry> {
        self.entries.lock().await.clone()
    }

    /// Discard and regenerate the derived entry set from raw entries.
    fn apply_recalculation(entries: &mut Vec<MeasurementEntry>) {
        entries.retain(|e| e.source != EntrySource::Derived);
        let derived = recompute_derived(entries);
        entries.extend(derived);
    }

    /// Derived entries are owned by the calculator; direct mutation from
    /// any other component is forbidden.
    fn reject_derived_mutation(entry: &MeasurementEntry, operation: &str) -> bool {
        if entry.source == EntrySource::Derived || entry.kind.is_derived() {
            warn!(kind = %entry.kind, operation, "rejecting direct mutation of derived entry");
            return true;
        }
        false
    }

    /// Persist the collection, best effort. The in-memory state is the
    /// source of truth for the running process; a failed write is repaired
    /// by the next successful one.
    async fn persist(&self, entries: &[MeasurementEntry]) {
        if let Err(err) = self.repository.replace_all(entries).await {
            warn!(error = %err, "failed to persist entry collection");
        }
    }

    async fn enqueue(&self, kind: OperationKind, entry: &MeasurementEntry) {
        if !entry.source.is_syncable() {
            return;
        }
        let op = SyncOperation::new(kind, entry);
        if let Err(err) = self.outbox.enqueue(op).await {
            warn!(error = %err, entry_id = %entry.id, "failed to enqueue sync operation");
        }
    }

    /// Mirror manual mutations to the external provider, fire-and-forget.
    fn mirror_to_provider(&self, entry: &MeasurementEntry) {
        if entry.source != EntrySource::Manual {
            return;
        }
        if let Some(push) = &self.provider_push {
            let push = Arc::clone(push);
            let entry = entry.clone();
            tokio::spawn(async move {
                push.push_entry(&entry).await;
            });
        }
    }
}

fn sort_newest_first(entries: &mut [MeasurementEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}
