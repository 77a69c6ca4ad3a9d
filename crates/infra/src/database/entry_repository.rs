//! SQLite-backed implementation of the entry repository port.
//!
//! The entry store treats its in-memory collection as the source of truth
//! and writes the whole collection on mutation, so the repository exposes a
//! load-everything / replace-everything surface rather than row-level CRUD.

use std::sync::Arc;

use async_trait::async_trait;
use bodylog_core::EntryRepository;
use bodylog_domain::{MeasurementEntry, Result as DomainResult};
use chrono::{TimeZone, Utc};
use rusqlite::{params, Row};
use tokio::task;
use tracing::warn;
use uuid::Uuid;

use super::manager::{map_sql_error, DbConnection, DbManager};
use crate::database::map_join_error;

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository {
    db: Arc<DbManager>,
}

impl SqliteEntryRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn fetch_all(conn: &DbConnection) -> DomainResult<Vec<MeasurementEntry>> {
        let mut stmt = conn.prepare(ENTRY_SELECT_SQL).map_err(map_sql_error)?;
        let rows = stmt.query_map([], map_entry_row).map_err(map_sql_error)?;

        let mut entries = Vec::new();
        for row in rows {
            let raw = row.map_err(map_sql_error)?;
            match raw.into_entry() {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry row");
                }
            }
        }
        Ok(entries)
    }

    fn store_all(conn: &mut DbConnection, entries: &[MeasurementEntry]) -> DomainResult<()> {
        let tx = conn.transaction().map_err(map_sql_error)?;
        tx.execute("DELETE FROM entries", []).map_err(map_sql_error)?;
        for entry in entries {
            tx.execute(
                ENTRY_INSERT_SQL,
                params![
                    entry.id.to_string(),
                    entry.kind.as_str(),
                    entry.date.timestamp(),
                    entry.value,
                    entry.source.as_str(),
                    entry.backend_id,
                ],
            )
            .map_err(map_sql_error)?;
        }
        tx.commit().map_err(map_sql_error)
    }
}

#[async_trait]
impl EntryRepository for SqliteEntryRepository {
    async fn load_all(&self) -> DomainResult<Vec<MeasurementEntry>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<MeasurementEntry>> {
            let conn = db.get_connection()?;
            Self::fetch_all(&conn)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn replace_all(&self, entries: &[MeasurementEntry]) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let to_store = entries.to_vec();

        task::spawn_blocking(move || -> DomainResult<()> {
            let mut conn = db.get_connection()?;
            Self::store_all(&mut conn, &to_store)
        })
        .await
        .map_err(map_join_error)?
    }
}

const ENTRY_SELECT_SQL: &str = "SELECT
        id, kind, recorded_at, value, source, backend_id
    FROM entries
    ORDER BY recorded_at DESC";

const ENTRY_INSERT_SQL: &str = "INSERT INTO entries (
        id, kind, recorded_at, value, source, backend_id
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

struct RawEntryRow {
    id: String,
    kind: String,
    recorded_at: i64,
    value: f64,
    source: String,
    backend_id: Option<String>,
}

impl RawEntryRow {
    fn into_entry(self) -> Result<MeasurementEntry, String> {
        let id = Uuid::parse_str(&self.id).map_err(|e| format!("invalid entry id: {e}"))?;
        let kind = self.kind.parse()?;
        let source = self.source.parse()?;
        let date = Utc
            .timestamp_opt(self.recorded_at, 0)
            .single()
            .ok_or_else(|| format!("invalid timestamp: {}", self.recorded_at))?;

        Ok(MeasurementEntry { id, date, value: self.value, kind, source, backend_id: self.backend_id })
    }
}

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<RawEntryRow> {
    Ok(RawEntryRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        recorded_at: row.get(2)?,
        value: row.get(3)?,
        source: row.get(4)?,
        backend_id: row.get(5)?,
    })
}
