//! Entry store persistence across process restarts.

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use async_trait::async_trait;
use bodylog_core::{EntryStore, OutboxQueue};
use bodylog_domain::{
    EntrySource, MeasurementEntry, MeasurementType, Result as DomainResult, SyncOperation,
};
use bodylog_infra::database::SqliteEntryRepository;

struct NullOutbox;

#[async_trait]
impl OutboxQueue for NullOutbox {
    async fn enqueue(&self, _op: SyncOperation) -> DomainResult<()> {
        Ok(())
    }
}

fn store_over(db: &support::TestDb) -> Arc<EntryStore> {
    let repo = Arc::new(SqliteEntryRepository::new(db.manager.clone()));
    Arc::new(EntryStore::new(repo, Arc::new(NullOutbox)))
}

#[tokio::test(flavor = "multi_thread")]
async fn entries_survive_restart_with_derived_recalculated() -> anyhow::Result<()> {
    let db = support::setup_db();

    let first = store_over(&db);
    first.add(support::manual_entry(MeasurementType::Weight, 10, 80.0)).await;
    first.add(support::manual_entry(MeasurementType::Height, 5, 180.0)).await;
    first.add(support::manual_entry(MeasurementType::Waist, 8, 85.0)).await;
    drop(first);

    let second = store_over(&db);
    second.load().await?;

    let weight = second.latest(MeasurementType::Weight).await.expect("weight survives");
    assert_eq!(weight.value, 80.0);
    assert_eq!(second.entries_for_type(MeasurementType::Waist, None).await.len(), 1);

    let bmi = second.latest(MeasurementType::Bmi).await.expect("bmi recomputed on load");
    assert!((bmi.value - 80.0 / (1.8 * 1.8)).abs() < 1e-9);
    assert_eq!(bmi.source, EntrySource::Derived);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_persisted_derived_rows_are_replaced_on_load() -> anyhow::Result<()> {
    let db = support::setup_db();
    let repo = Arc::new(SqliteEntryRepository::new(db.manager.clone()));

    // A previous version left a derived row inconsistent with its inputs
    let stale =
        MeasurementEntry::new(MeasurementType::Bmi, support::at(10, 8), 99.0, EntrySource::Derived);
    let weight = support::manual_entry(MeasurementType::Weight, 10, 80.0);
    let height = support::manual_entry(MeasurementType::Height, 5, 180.0);
    {
        use bodylog_core::EntryRepository;
        repo.replace_all(&[stale, weight, height]).await?;
    }

    let store = Arc::new(EntryStore::new(repo, Arc::new(NullOutbox)));
    store.load().await?;

    let bmi = store.latest(MeasurementType::Bmi).await.expect("bmi present");
    assert!((bmi.value - 80.0 / (1.8 * 1.8)).abs() < 1e-9);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn backend_id_association_is_persisted() -> anyhow::Result<()> {
    let db = support::setup_db();

    let first = store_over(&db);
    let entry = support::manual_entry(MeasurementType::Weight, 10, 75.0);
    first.add(entry.clone()).await;
    first.associate_backend_id(entry.id, "backend-9".into()).await;
    drop(first);

    let second = store_over(&db);
    second.load().await?;

    let weight = second.latest(MeasurementType::Weight).await.expect("weight survives");
    assert_eq!(weight.backend_id.as_deref(), Some("backend-9"));
    Ok(())
}
