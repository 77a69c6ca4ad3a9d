//! Domain types and models

pub mod measurement;
pub mod provider;
pub mod sync;

pub use measurement::{EntrySource, MeasurementEntry, MeasurementType};
pub use provider::{ProviderSample, APP_ORIGIN_MARKER};
pub use sync::{EntrySnapshot, OperationKind, SyncOperation, SyncStatus};
