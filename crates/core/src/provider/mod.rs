//! External health-data provider ports

pub mod ports;

pub use ports::{ProviderGateway, ProviderPush};
