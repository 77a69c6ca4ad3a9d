//! SQLite-backed implementation of the outbox storage port.
//!
//! Operations are stored with their entry snapshot serialized as JSON and
//! drained in ascending `created_at` order. `next_attempt_at` gates retry
//! eligibility; rows past the attempt ceiling are removed by the drainer.

use std::sync::Arc;

use async_trait::async_trait;
use bodylog_core::OutboxRepository;
use bodylog_domain::{Result as DomainResult, SyncOperation};
use rusqlite::{params, Row};
use tokio::task;
use tracing::warn;
use uuid::Uuid;

use super::manager::{map_sql_error, DbConnection, DbManager};
use crate::database::map_join_error;

/// SQLite-backed outbox repository.
pub struct SqliteOutboxRepository {
    db: Arc<DbManager>,
}

impl SqliteOutboxRepository {
    /// Construct a repository backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert_op(conn: &DbConnection, op: &SyncOperation) -> DomainResult<()> {
        let payload = serde_json::to_string(&op.snapshot)
            .map_err(|e| bodylog_domain::BodylogError::Persistence(e.to_string()))?;

        conn.execute(
            OUTBOX_INSERT_SQL,
            params![
                op.id.to_string(),
                op.kind.as_str(),
                payload,
                op.attempts,
                op.created_at,
                op.next_attempt_at,
                op.last_error,
            ],
        )
        .map_err(map_sql_error)?;
        Ok(())
    }

    fn fetch_due(conn: &DbConnection, now: i64) -> DomainResult<Vec<SyncOperation>> {
        let mut stmt = conn.prepare(OUTBOX_DUE_SQL).map_err(map_sql_error)?;
        let rows = stmt.query_map(params![now], map_outbox_row).map_err(map_sql_error)?;

        let mut ops = Vec::new();
        for row in rows {
            let raw = row.map_err(map_sql_error)?;
            match raw.into_operation() {
                Ok(op) => ops.push(op),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable outbox row");
                }
            }
        }
        Ok(ops)
    }
}

#[async_trait]
impl OutboxRepository for SqliteOutboxRepository {
    async fn insert(&self, op: &SyncOperation) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let to_insert = op.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            Self::insert_op(&conn, &to_insert)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn due_operations(&self, now: i64) -> DomainResult<Vec<SyncOperation>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<SyncOperation>> {
            let conn = db.get_connection()?;
            Self::fetch_due(&conn, now)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn remove(&self, id: Uuid) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM sync_outbox WHERE id = ?1", params![id.to_string()])
                .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn record_failure(
        &self,
        id: Uuid,
        attempts: u32,
        next_attempt_at: i64,
        error: &str,
    ) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let error = truncate_reason(error);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "UPDATE sync_outbox
                 SET attempts = ?2, next_attempt_at = ?3, last_error = ?4
                 WHERE id = ?1",
                params![id.to_string(), attempts, next_attempt_at, error],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn pending_count(&self) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM sync_outbox", [], |row| row.get(0))
                .map_err(map_sql_error)?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
        .map_err(map_join_error)?
    }
}

const OUTBOX_INSERT_SQL: &str = "INSERT OR REPLACE INTO sync_outbox (
        id, op_kind, payload_json, attempts, created_at, next_attempt_at, last_error
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const OUTBOX_DUE_SQL: &str = "SELECT
        id, op_kind, payload_json, attempts, created_at, next_attempt_at, last_error
    FROM sync_outbox
    WHERE next_attempt_at IS NULL OR next_attempt_at <= ?1
    ORDER BY created_at ASC, rowid ASC";

struct RawOutboxRow {
    id: String,
    op_kind: String,
    payload_json: String,
    attempts: u32,
    created_at: i64,
    next_attempt_at: Option<i64>,
    last_error: Option<String>,
}

impl RawOutboxRow {
    fn into_operation(self) -> Result<SyncOperation, String> {
        let id = Uuid::parse_str(&self.id).map_err(|e| format!("invalid operation id: {e}"))?;
        let kind = self.op_kind.parse()?;
        let snapshot = serde_json::from_str(&self.payload_json)
            .map_err(|e| format!("invalid payload: {e}"))?;

        Ok(SyncOperation {
            id,
            kind,
            snapshot,
            attempts: self.attempts,
            created_at: self.created_at,
            next_attempt_at: self.next_attempt_at,
            last_error: self.last_error,
        })
    }
}

fn map_outbox_row(row: &Row<'_>) -> rusqlite::Result<RawOutboxRow> {
    Ok(RawOutboxRow {
        id: row.get(0)?,
        op_kind: row.get(1)?,
        payload_json: row.get(2)?,
        attempts: row.get(3)?,
        created_at: row.get(4)?,
        next_attempt_at: row.get(5)?,
        last_error: row.get(6)?,
    })
}

fn truncate_reason(reason: &str) -> String {
    const MAX_LEN: usize = 256;
    if reason.len() <= MAX_LEN {
        return reason.to_string();
    }

    let mut truncated = reason.chars().take(MAX_LEN.saturating_sub(3)).collect::<String>();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use bodylog_domain::{EntrySource, MeasurementEntry, MeasurementType, OperationKind};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    async fn setup_repository() -> (SqliteOutboxRepository, Arc<DbManager>, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("manager created");
        manager.run_migrations().expect("migrations applied");
        let manager = Arc::new(manager);
        let repo = SqliteOutboxRepository::new(Arc::clone(&manager));

        (repo, manager, temp_dir)
    }

    fn sample_op(kind: OperationKind, created_at: i64) -> SyncOperation {
        let date = Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap();
        let entry = MeasurementEntry::new(MeasurementType::Weight, date, 75.0, EntrySource::Manual);
        let mut op = SyncOperation::new(kind, &entry);
        op.created_at = created_at;
        op
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn due_operations_preserve_enqueue_order() {
        let (repo, _manager, _temp_dir) = setup_repository().await;

        let first = sample_op(OperationKind::Create, 1_700_000_000);
        let second = sample_op(OperationKind::Update, 1_700_000_010);
        let third = sample_op(OperationKind::Delete, 1_700_000_020);

        // Insert out of order on purpose
        repo.insert(&third).await.expect("insert third");
        repo.insert(&first).await.expect("insert first");
        repo.insert(&second).await.expect("insert second");

        let due = repo.due_operations(1_800_000_000).await.expect("query succeeds");
        let ids: Vec<_> = due.iter().map(|op| op.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn due_operations_respect_next_attempt_at() {
        let (repo, _manager, _temp_dir) = setup_repository().await;
        let now = 1_700_000_100;

        let mut deferred = sample_op(OperationKind::Create, now - 50);
        deferred.next_attempt_at = Some(now + 3_600);
        repo.insert(&deferred).await.expect("insert deferred");

        let mut due_past = sample_op(OperationKind::Create, now - 40);
        due_past.next_attempt_at = Some(now - 60);
        repo.insert(&due_past).await.expect("insert due");

        let immediate = sample_op(OperationKind::Create, now - 30);
        repo.insert(&immediate).await.expect("insert immediate");

        let due = repo.due_operations(now).await.expect("query succeeds");
        let ids: Vec<_> = due.iter().map(|op| op.id).collect();
        assert!(ids.contains(&due_past.id) && ids.contains(&immediate.id));
        assert!(!ids.contains(&deferred.id));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn record_failure_updates_retry_bookkeeping() {
        let (repo, _manager, _temp_dir) = setup_repository().await;

        let op = sample_op(OperationKind::Update, 1_700_000_000);
        repo.insert(&op).await.expect("insert succeeds");

        repo.record_failure(op.id, 1, 1_900_000_000, "server error").await.expect("failure saved");

        let due = repo.due_operations(2_000_000_000).await.expect("query succeeds");
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].attempts, 1);
        assert_eq!(due[0].next_attempt_at, Some(1_900_000_000));
        assert_eq!(due[0].last_error.as_deref(), Some("server error"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_and_pending_count() {
        let (repo, _manager, _temp_dir) = setup_repository().await;

        let op = sample_op(OperationKind::Delete, 1_700_000_000);
        repo.insert(&op).await.expect("insert succeeds");
        assert_eq!(repo.pending_count().await.expect("count"), 1);

        repo.remove(op.id).await.expect("remove succeeds");
        assert_eq!(repo.pending_count().await.expect("count"), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn snapshot_round_trips_through_json() {
        let (repo, _manager, _temp_dir) = setup_repository().await;

        let op = sample_op(OperationKind::Create, 1_700_000_000);
        repo.insert(&op).await.expect("insert succeeds");

        let due = repo.due_operations(1_800_000_000).await.expect("query succeeds");
        assert_eq!(due[0].snapshot, op.snapshot);
        assert_eq!(due[0].kind, OperationKind::Create);
    }
}
