//! Sync queue ports and status observables

pub mod ports;
pub mod state;

pub use ports::{OutboxQueue, OutboxRepository};
pub use state::SyncState;
