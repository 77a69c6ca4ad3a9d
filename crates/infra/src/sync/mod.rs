//! Backend synchronization: auth, HTTP client, and the queue drainer

pub mod auth;
pub mod backend_client;
pub mod errors;
pub mod queue;

pub use auth::{AccessTokenProvider, KeyringTokenProvider};
pub use backend_client::{BackendApi, BackendClient, BackendClientConfig};
pub use errors::{SyncError, SyncErrorCategory};
pub use queue::{calculate_backoff, SyncQueueConfig, SyncQueueService};
