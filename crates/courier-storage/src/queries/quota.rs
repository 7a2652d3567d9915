// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-provider daily send counters.

use chrono::NaiveDate;
use courier_core::CourierError;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, format_day, map_tr_err};

/// Successful sends recorded for a provider on a UTC day.
pub async fn sends_on(db: &Database, provider_id: &str, day: NaiveDate) -> Result<u32, CourierError> {
    let provider_id = provider_id.to_string();
    let day = format_day(day);
    db.connection()
        .call(move |conn| {
            let sends: Option<u32> = conn
                .query_row(
                    "SELECT sends FROM provider_quota WHERE provider_id = ?1 AND day = ?2",
                    params![provider_id, day],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(sends.unwrap_or(0))
        })
        .await
        .map_err(map_tr_err)
}

/// Add one successful send (upsert).
pub async fn record_send(
    db: &Database,
    provider_id: &str,
    day: NaiveDate,
) -> Result<(), CourierError> {
    let provider_id = provider_id.to_string();
    let day = format_day(day);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO provider_quota (provider_id, day, sends) VALUES (?1, ?2, 1)
                 ON CONFLICT(provider_id, day) DO UPDATE SET sends = sends + 1",
                params![provider_id, day],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn counts_per_provider_and_day() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("q.db").to_str().unwrap())
            .await
            .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let tomorrow = today.succ_opt().unwrap();

        assert_eq!(sends_on(&db, "p1", today).await.unwrap(), 0);
        record_send(&db, "p1", today).await.unwrap();
        record_send(&db, "p1", today).await.unwrap();
        record_send(&db, "p2", today).await.unwrap();

        assert_eq!(sends_on(&db, "p1", today).await.unwrap(), 2);
        assert_eq!(sends_on(&db, "p2", today).await.unwrap(), 1);
        assert_eq!(sends_on(&db, "p1", tomorrow).await.unwrap(), 0);
        db.close().await.unwrap();
    }
}
