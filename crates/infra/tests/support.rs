//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bodylog_domain::{EntrySource, MeasurementEntry, MeasurementType};
use bodylog_infra::database::DbManager;
use bodylog_infra::{AccessTokenProvider, SyncError};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

pub struct TestDb {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

pub fn setup_db() -> TestDb {
    let temp_dir = TempDir::new().expect("temp dir created");
    let db_path = temp_dir.path().join("test.db");

    let manager = DbManager::new(&db_path, 4).expect("manager created");
    manager.run_migrations().expect("migrations applied");

    TestDb { manager: Arc::new(manager), _temp_dir: temp_dir }
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn manual_entry(kind: MeasurementType, day: u32, value: f64) -> MeasurementEntry {
    MeasurementEntry::new(kind, at(day, 8), value, EntrySource::Manual)
}

/// Token provider that always hands out the same token.
pub struct StaticTokenProvider {
    pub token: String,
}

impl StaticTokenProvider {
    pub fn new(token: &str) -> Arc<Self> {
        Arc::new(Self { token: token.to_string() })
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, SyncError> {
        Ok(self.token.clone())
    }

    async fn refresh(&self) -> Result<String, SyncError> {
        Ok(self.token.clone())
    }
}
