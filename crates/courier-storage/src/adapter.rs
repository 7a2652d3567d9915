// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the reminder, quota, and audit store traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use courier_config::model::StorageConfig;
use courier_core::{
    AuditStore, AuditStream, CourierError, QuotaLedger, ReminderState, ReminderStore,
    ReminderWorkItem, StampedAuditRecord,
};

use crate::database::Database;
use crate::queries;
use crate::queries::maintenance::Collection;

/// SQLite-backed store.
///
/// The database is opened lazily by [`SqliteStorage::initialize`]; every
/// other call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and apply migrations.
    pub async fn initialize(&self) -> Result<(), CourierError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoint the WAL. The connection itself closes on drop.
    pub async fn close(&self) -> Result<(), CourierError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Liveness probe against the database.
    pub async fn health_check(&self) -> Result<(), CourierError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }

    pub async fn wipe_collection(&self, collection: Collection) -> Result<u64, CourierError> {
        queries::maintenance::wipe_collection(self.db()?, collection).await
    }

    pub async fn collection_counts(&self) -> Result<Value, CourierError> {
        queries::maintenance::collection_counts(self.db()?).await
    }

    /// Read back an audit stream in write order.
    pub async fn audit_entries(
        &self,
        stream: AuditStream,
    ) -> Result<Vec<StampedAuditRecord>, CourierError> {
        queries::audit::list(self.db()?, stream).await
    }

    fn db(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl ReminderStore for SqliteStorage {
    async fn insert_reminder(&self, item: &ReminderWorkItem) -> Result<(), CourierError> {
        queries::reminders::insert_reminder(self.db()?, item).await
    }

    async fn get_reminder(&self, id: &str) -> Result<Option<ReminderWorkItem>, CourierError> {
        queries::reminders::get_reminder(self.db()?, id).await
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ReminderWorkItem>, CourierError> {
        queries::reminders::list_due(self.db()?, now, limit).await
    }

    async fn compare_and_set_state(
        &self,
        id: &str,
        expected: ReminderState,
        next: ReminderState,
    ) -> Result<bool, CourierError> {
        queries::reminders::compare_and_set_state(self.db()?, id, expected, next).await
    }

    async fn record_attempt(
        &self,
        id: &str,
        provider_id: &str,
        error: Option<&str>,
    ) -> Result<(), CourierError> {
        queries::reminders::record_attempt(self.db()?, id, provider_id, error).await
    }

    async fn reclaim_stale(&self, claimed_before: DateTime<Utc>) -> Result<u64, CourierError> {
        queries::reminders::reclaim_stale(self.db()?, claimed_before).await
    }
}

#[async_trait]
impl QuotaLedger for SqliteStorage {
    async fn sends_on(&self, provider_id: &str, day: NaiveDate) -> Result<u32, CourierError> {
        queries::quota::sends_on(self.db()?, provider_id, day).await
    }

    async fn record_send(&self, provider_id: &str, day: NaiveDate) -> Result<(), CourierError> {
        queries::quota::record_send(self.db()?, provider_id, day).await
    }
}

#[async_trait]
impl AuditStore for SqliteStorage {
    async fn append(&self, entry: &StampedAuditRecord) -> Result<String, CourierError> {
        queries::audit::append(self.db()?, entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn config(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("adapter.db").display().to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn uninitialized_storage_errors() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir));
        let err = storage.get_reminder("x").await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn double_initialize_errors() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn trait_methods_delegate() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir));
        storage.initialize().await.unwrap();
        storage.health_check().await.unwrap();

        let item = ReminderWorkItem::pending("r1", "a@example.com", json!({}), Utc::now());
        storage.insert_reminder(&item).await.unwrap();
        assert!(
            storage
                .compare_and_set_state("r1", ReminderState::Pending, ReminderState::InFlight)
                .await
                .unwrap()
        );
        storage.record_send("p1", Utc::now().date_naive()).await.unwrap();
        assert_eq!(
            storage.sends_on("p1", Utc::now().date_naive()).await.unwrap(),
            1
        );
        storage.close().await.unwrap();
    }
}
