//! Sync operation types
//!
//! A [`SyncOperation`] is a queued intent to create, update, or delete one
//! entry on the remote backend. Operations carry a value snapshot of the
//! entry taken at enqueue time, so later entry mutation cannot corrupt an
//! in-flight payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::measurement::{EntrySource, MeasurementEntry, MeasurementType};

/// Kind of remote mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::str::FromStr for OperationKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown operation kind: {other}")),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value snapshot of an entry at enqueue time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntrySnapshot {
    pub entry_id: Uuid,
    pub kind: MeasurementType,
    pub date: DateTime<Utc>,
    pub value: f64,
    pub source: EntrySource,
    pub backend_id: Option<String>,
}

impl EntrySnapshot {
    pub fn of(entry: &MeasurementEntry) -> Self {
        Self {
            entry_id: entry.id,
            kind: entry.kind,
            date: entry.date,
            value: entry.value,
            source: entry.source,
            backend_id: entry.backend_id.clone(),
        }
    }

    /// Identifier used to address the entry on the backend: the
    /// backend-assigned id when known, else the local id.
    pub fn remote_id(&self) -> String {
        self.backend_id.clone().unwrap_or_else(|| self.entry_id.to_string())
    }
}

/// A queued remote mutation with retry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOperation {
    pub id: Uuid,
    pub kind: OperationKind,
    pub snapshot: EntrySnapshot,
    /// Failed attempt count; the operation is abandoned at the ceiling.
    pub attempts: u32,
    /// Enqueue time, epoch seconds. Drain order is ascending `created_at`.
    pub created_at: i64,
    /// Earliest epoch-second timestamp the next attempt may run at.
    pub next_attempt_at: Option<i64>,
    pub last_error: Option<String>,
}

impl SyncOperation {
    pub fn new(kind: OperationKind, entry: &MeasurementEntry) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            snapshot: EntrySnapshot::of(entry),
            attempts: 0,
            created_at: Utc::now().timestamp(),
            next_attempt_at: None,
            last_error: None,
        }
    }
}

/// Queue drain status exposed to collaborators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Idle,
    InProgress,
    Completed,
}
