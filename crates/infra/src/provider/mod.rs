//! External health-provider integration

pub mod reconciler;

pub use reconciler::ProviderReconciler;
