//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

use crate::types::measurement::MeasurementType;

// Sync queue configuration
pub const MAX_SYNC_ATTEMPTS: u32 = 3;
pub const BACKOFF_BASE_MS: u64 = 1_000;
pub const BACKOFF_CAP_MS: u64 = 32_000;
pub const REQUEST_TIMEOUT_SECS: u64 = 8;

// Scheduler cadence
pub const DEFAULT_DRAIN_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 900;

/// Measurement kinds considered when building a historical snapshot
/// (`entries_as_of`): every raw, user-recordable kind.
pub const RELEVANT_KINDS: &[MeasurementType] = &[
    MeasurementType::Weight,
    MeasurementType::Height,
    MeasurementType::BodyFat,
    MeasurementType::Waist,
    MeasurementType::Bicep,
    MeasurementType::Chest,
    MeasurementType::Thigh,
    MeasurementType::Shoulder,
    MeasurementType::Glutes,
];
