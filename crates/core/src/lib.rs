//! # Bodylog Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The Entry Store service and the derived metric calculator
//! - Port/adapter interfaces (traits) for persistence, sync, and the
//!   external health-data provider
//! - Sync status observables shared with collaborators
//!
//! ## Architecture Principles
//! - Only depends on `bodylog-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod metrics;
pub mod provider;
pub mod store;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use metrics::calculator::recompute_derived;
pub use provider::ports::{ProviderGateway, ProviderPush};
pub use store::ports::EntryRepository;
pub use store::EntryStore;
pub use sync::ports::{OutboxQueue, OutboxRepository};
pub use sync::state::SyncState;
