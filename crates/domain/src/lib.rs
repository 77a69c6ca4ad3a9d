//! # Bodylog Domain
//!
//! Business domain types and models for Bodylog.
//!
//! This crate contains:
//! - Domain data types (MeasurementEntry, SyncOperation, ProviderSample)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Bodylog crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::{Config, DatabaseConfig, ProviderConfig, SyncConfig};
pub use errors::{BodylogError, Result};
pub use types::measurement::{EntrySource, MeasurementEntry, MeasurementType};
pub use types::provider::{ProviderSample, APP_ORIGIN_MARKER};
pub use types::sync::{EntrySnapshot, OperationKind, SyncOperation, SyncStatus};
