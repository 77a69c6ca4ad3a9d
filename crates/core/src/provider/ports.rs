//! Port interfaces for the external health-data provider

use async_trait::async_trait;
use bodylog_domain::{MeasurementEntry, MeasurementType, ProviderSample, Result};
use chrono::{DateTime, Utc};

/// Trait for reading and writing samples at the external provider.
///
/// All operations are keyed by provider-assigned sample identifiers that are
/// opaque to this engine.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Fetch the provider's full sample set for a kind (unbounded history)
    async fn fetch_samples(&self, kind: MeasurementType) -> Result<Vec<ProviderSample>>;

    /// Save a sample, carrying this app's origin marker
    async fn save_sample(&self, sample: &ProviderSample) -> Result<()>;

    /// Delete matching samples of a kind in `[start, end)`
    async fn delete_samples(
        &self,
        kind: MeasurementType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<()>;
}

/// Trait for the best-effort local-to-provider push path.
///
/// Push failures are swallowed by the implementation: they must never block
/// the caller or consume backend retry budget.
#[async_trait]
pub trait ProviderPush: Send + Sync {
    /// Push a single entry to the provider, fire-and-forget
    async fn push_entry(&self, entry: &MeasurementEntry);
}
