//! Entry store service and persistence ports

pub mod ports;
pub mod service;

pub use service::EntryStore;
