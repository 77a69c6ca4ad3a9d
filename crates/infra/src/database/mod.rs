//! SQLite persistence layer

pub mod entry_repository;
pub mod manager;
pub mod outbox_repository;

use bodylog_domain::BodylogError;
pub use entry_repository::SqliteEntryRepository;
pub use manager::{DbConnection, DbManager};
pub use outbox_repository::SqliteOutboxRepository;
use tokio::task;

pub(crate) fn map_join_error(err: task::JoinError) -> BodylogError {
    if err.is_cancelled() {
        BodylogError::Internal("database task cancelled".into())
    } else {
        BodylogError::Internal(format!("database task panic: {err}"))
    }
}
