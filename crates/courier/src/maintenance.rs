// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier status` and `courier wipe`.

use courier_config::CourierConfig;
use courier_core::CourierError;
use courier_storage::{Collection, SqliteStorage};
use tracing::{info, warn};

/// Probe the database and report row counts per collection.
pub async fn run_status(config: &CourierConfig) -> Result<serde_json::Value, CourierError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    storage.health_check().await?;
    let counts = storage.collection_counts().await?;
    storage.close().await?;

    Ok(serde_json::json!({
        "environment": config.app.environment.to_string(),
        "database_path": config.storage.database_path,
        "providers": config.providers.len(),
        "collections": counts,
    }))
}

/// Delete every row of one collection.
///
/// Refused in production and without explicit confirmation.
pub async fn run_wipe(
    config: &CourierConfig,
    collection: Collection,
    confirmed: bool,
) -> Result<u64, CourierError> {
    if config.app.environment.is_production() {
        warn!(%collection, "wipe refused in production");
        return Err(CourierError::Forbidden(format!(
            "refusing to wipe `{collection}` in production"
        )));
    }
    if !confirmed {
        return Err(CourierError::Forbidden(format!(
            "wiping `{collection}` deletes every row; pass --yes to confirm"
        )));
    }

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let deleted = storage.wipe_collection(collection).await?;
    storage.close().await?;

    info!(%collection, deleted, "collection wiped");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::Environment;
    use courier_core::ReminderStore;
    use courier_test_utils::fixtures::due_reminder;

    fn config_in(dir: &tempfile::TempDir) -> CourierConfig {
        let mut config = CourierConfig::default();
        config.storage.database_path = dir
            .path()
            .join("courier.db")
            .to_string_lossy()
            .into_owned();
        config
    }

    async fn seed(config: &CourierConfig, ids: &[&str]) {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await.unwrap();
        for id in ids {
            storage.insert_reminder(&due_reminder(id)).await.unwrap();
        }
        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn wipe_deletes_rows_when_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        seed(&config, &["a", "b"]).await;

        let deleted = run_wipe(&config, Collection::Reminders, true).await.unwrap();
        assert_eq!(deleted, 2);

        let status = run_status(&config).await.unwrap();
        assert_eq!(status["collections"]["reminders"], 0);
    }

    #[tokio::test]
    async fn wipe_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        seed(&config, &["a"]).await;

        let err = run_wipe(&config, Collection::Reminders, false)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Forbidden(_)));
        let status = run_status(&config).await.unwrap();
        assert_eq!(status["collections"]["reminders"], 1);
    }

    #[tokio::test]
    async fn wipe_is_refused_in_production() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(&dir);
        config.app.environment = Environment::Production;

        let err = run_wipe(&config, Collection::MailLogs, true)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Forbidden(_)));
        assert!(!dir.path().join("courier.db").exists());
    }
}
