//! External health-provider reconciler
//!
//! Mirrors the provider's sample set into the entry store and pushes local
//! manual entries back out. The provider has no change feed, so each pass
//! fetches the full sample history per kind and diffs the local
//! provider-sourced entries against it. Samples carrying this app's origin
//! marker are skipped on import, which breaks the write-read echo loop.
//!
//! Absence from the fetched set is itself grounds for deletion: an entry
//! persisted by an earlier process run whose sample has since disappeared
//! is removed on the first pass that observes the gap.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bodylog_core::{EntryStore, ProviderGateway, ProviderPush};
use bodylog_domain::{
    EntrySource, MeasurementEntry, MeasurementType, ProviderConfig, ProviderSample, Result,
    APP_ORIGIN_MARKER,
};
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

/// Kinds the external provider exchanges with this engine.
const PROVIDER_KINDS: &[MeasurementType] =
    &[MeasurementType::Weight, MeasurementType::Height, MeasurementType::BodyFat];

/// Full-fetch reconciler between the provider and the entry store.
pub struct ProviderReconciler {
    gateway: Arc<dyn ProviderGateway>,
    store: Arc<EntryStore>,
    config: ProviderConfig,
}

impl ProviderReconciler {
    /// Create a reconciler over the given gateway and store.
    pub fn new(
        gateway: Arc<dyn ProviderGateway>,
        store: Arc<EntryStore>,
        config: ProviderConfig,
    ) -> Self {
        Self { gateway, store, config }
    }

    /// Run one reconcile pass over all provider kinds.
    pub async fn reconcile(&self) -> Result<()> {
        if !self.config.read_enabled {
            debug!("provider reads disabled, skipping reconcile");
            return Ok(());
        }

        for kind in PROVIDER_KINDS {
            if let Err(err) = self.reconcile_kind(*kind).await {
                warn!(kind = %kind, error = %err, "provider reconcile failed for kind");
            }
        }
        Ok(())
    }

    async fn reconcile_kind(&self, kind: MeasurementType) -> Result<()> {
        let samples = self.gateway.fetch_samples(kind).await?;

        let mut current_days: HashSet<NaiveDate> = HashSet::new();
        let mut imported = 0_usize;

        for sample in &samples {
            if sample.is_app_originated() {
                continue;
            }
            current_days.insert(sample.start.date_naive());

            // Replace-not-duplicate semantics in the store make re-imports
            // of unchanged samples no-ops.
            let entry =
                MeasurementEntry::new(kind, sample.start, sample.value, EntrySource::Provider);
            self.store.add(entry).await;
            imported += 1;
        }

        self.apply_deletions(kind, &current_days).await;

        debug!(kind = %kind, samples = samples.len(), imported, "provider kind reconciled");
        Ok(())
    }

    /// Remove local provider entries whose day has no sample left in the
    /// fetched set. Covers deletions that happened while the app was not
    /// running, since the diff is against storage-backed state rather than
    /// anything remembered in memory.
    async fn apply_deletions(&self, kind: MeasurementType, current_days: &HashSet<NaiveDate>) {
        let stale: Vec<MeasurementEntry> = self
            .store
            .entries_for_type(kind, Some(EntrySource::Provider))
            .await
            .into_iter()
            .filter(|entry| !current_days.contains(&entry.day()))
            .collect();

        for entry in stale {
            info!(kind = %kind, day = %entry.day(), "provider sample gone, removing local entry");
            self.store.remove(&entry).await;
        }
    }
}

#[async_trait]
impl ProviderPush for ProviderReconciler {
    async fn push_entry(&self, entry: &MeasurementEntry) {
        if !self.config.write_enabled {
            return;
        }
        if !PROVIDER_KINDS.contains(&entry.kind) {
            return;
        }

        let day = entry.day();
        let Some(next_day) = day.succ_opt() else {
            return;
        };
        let window_start = day.and_time(NaiveTime::MIN).and_utc();
        let window_end = next_day.and_time(NaiveTime::MIN).and_utc();

        // Clear this app's earlier sample for the day so the provider never
        // holds two values for one calendar day.
        if let Err(err) = self.gateway.delete_samples(entry.kind, window_start, window_end).await {
            debug!(kind = %entry.kind, error = %err, "clearing prior provider sample failed");
        }

        let sample = ProviderSample {
            sample_id: entry.id.to_string(),
            kind: entry.kind,
            value: entry.value,
            start: entry.date,
            end: entry.date,
            origin: Some(APP_ORIGIN_MARKER.to_string()),
        };

        if let Err(err) = self.gateway.save_sample(&sample).await {
            warn!(kind = %entry.kind, error = %err, "provider push failed");
        }
    }
}
