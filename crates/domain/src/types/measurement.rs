//! Measurement entry types
//!
//! A [`MeasurementEntry`] is a single dated body measurement, either raw
//! (recorded by the user or imported from the health provider) or derived
//! (computed from raw entries, owned by the metric calculator).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of measurement, partitioned into raw and derived kinds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementType {
    // Raw kinds, directly recorded
    Weight,
    Height,
    BodyFat,
    Waist,
    Bicep,
    Chest,
    Thigh,
    Shoulder,
    Glutes,
    // Derived kinds, owned by the calculator
    Bmi,
    LeanBodyMass,
    FatMass,
    FatFreeMassIndex,
    BasalMetabolicRate,
    BodySurfaceArea,
}

impl MeasurementType {
    /// Whether this kind is computed rather than recorded.
    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Self::Bmi
                | Self::LeanBodyMass
                | Self::FatMass
                | Self::FatFreeMassIndex
                | Self::BasalMetabolicRate
                | Self::BodySurfaceArea
        )
    }

    /// Whether a mutation of this kind invalidates the derived cascade.
    pub fn triggers_recalculation(self) -> bool {
        matches!(self, Self::Weight | Self::Height | Self::BodyFat)
    }

    /// Stable identifier used in storage and wire payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Height => "height",
            Self::BodyFat => "body_fat",
            Self::Waist => "waist",
            Self::Bicep => "bicep",
            Self::Chest => "chest",
            Self::Thigh => "thigh",
            Self::Shoulder => "shoulder",
            Self::Glutes => "glutes",
            Self::Bmi => "bmi",
            Self::LeanBodyMass => "lean_body_mass",
            Self::FatMass => "fat_mass",
            Self::FatFreeMassIndex => "fat_free_mass_index",
            Self::BasalMetabolicRate => "basal_metabolic_rate",
            Self::BodySurfaceArea => "body_surface_area",
        }
    }
}

impl std::str::FromStr for MeasurementType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "weight" => Ok(Self::Weight),
            "height" => Ok(Self::Height),
            "body_fat" => Ok(Self::BodyFat),
            "waist" => Ok(Self::Waist),
            "bicep" => Ok(Self::Bicep),
            "chest" => Ok(Self::Chest),
            "thigh" => Ok(Self::Thigh),
            "shoulder" => Ok(Self::Shoulder),
            "glutes" => Ok(Self::Glutes),
            "bmi" => Ok(Self::Bmi),
            "lean_body_mass" => Ok(Self::LeanBodyMass),
            "fat_mass" => Ok(Self::FatMass),
            "fat_free_mass_index" => Ok(Self::FatFreeMassIndex),
            "basal_metabolic_rate" => Ok(Self::BasalMetabolicRate),
            "body_surface_area" => Ok(Self::BodySurfaceArea),
            other => Err(format!("unknown measurement type: {other}")),
        }
    }
}

impl std::fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an entry came from. Determines editability and sync eligibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Recorded by the user in this app
    Manual,
    /// Imported from the external health-data provider
    Provider,
    /// Computed by the derived metric calculator
    Derived,
}

impl EntrySource {
    /// Derived entries are never pushed to the backend or the provider.
    pub fn is_syncable(self) -> bool {
        !matches!(self, Self::Derived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Provider => "provider",
            Self::Derived => "derived",
        }
    }
}

impl std::str::FromStr for EntrySource {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "manual" => Ok(Self::Manual),
            "provider" => Ok(Self::Provider),
            "derived" => Ok(Self::Derived),
            other => Err(format!("unknown entry source: {other}")),
        }
    }
}

impl std::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated measurement record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementEntry {
    /// Opaque unique identifier, assigned at creation, immutable.
    pub id: Uuid,
    /// Timestamp the measurement applies to (not necessarily creation time).
    pub date: DateTime<Utc>,
    pub value: f64,
    pub kind: MeasurementType,
    pub source: EntrySource,
    /// Identifier assigned by the remote backend once the entry has been
    /// created there. Transitions from `None` to `Some` once, never back.
    pub backend_id: Option<String>,
}

impl MeasurementEntry {
    /// Create a new entry with a fresh id and no backend association.
    pub fn new(
        kind: MeasurementType,
        date: DateTime<Utc>,
        value: f64,
        source: EntrySource,
    ) -> Self {
        Self { id: Uuid::now_v7(), date, value, kind, source, backend_id: None }
    }

    /// Calendar day this entry applies to, used for the one-per-day key.
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Uniqueness key: at most one entry exists per (day, kind, source).
    pub fn day_key(&self) -> (NaiveDate, MeasurementType, EntrySource) {
        (self.day(), self.kind, self.source)
    }
}
