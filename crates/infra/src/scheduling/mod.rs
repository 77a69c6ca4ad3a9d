//! Interval schedulers with explicit lifecycle management

pub mod drain_scheduler;
pub mod error;
pub mod reconcile_scheduler;

pub use drain_scheduler::{DrainScheduler, DrainSchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use reconcile_scheduler::{ReconcileScheduler, ReconcileSchedulerConfig};
