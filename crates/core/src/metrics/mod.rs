//! Derived metric calculation

pub mod calculator;

pub use calculator::recompute_derived;
