//! # Bodylog Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite-backed repositories for entries and the sync outbox
//! - The HTTP backend client and sync queue drainer
//! - The external health-provider reconciler
//! - Interval schedulers with explicit lifecycle management
//!
//! ## Architecture
//! - Implements traits defined in `bodylog-core`
//! - Depends on `bodylog-domain` and `bodylog-core`
//! - Contains all "impure" code (I/O, HTTP, keychain)

pub mod config;
pub mod database;
pub mod provider;
pub mod scheduling;
pub mod sync;

pub use database::{DbManager, SqliteEntryRepository, SqliteOutboxRepository};
pub use provider::ProviderReconciler;
pub use scheduling::{DrainScheduler, ReconcileScheduler, SchedulerError};
pub use sync::{
    AccessTokenProvider, BackendApi, BackendClient, BackendClientConfig, KeyringTokenProvider,
    SyncError, SyncQueueConfig, SyncQueueService,
};
