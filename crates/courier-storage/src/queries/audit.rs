// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit log writes and reads.

use courier_core::{AuditRecord, AuditStream, CourierError, StampedAuditRecord};
use rusqlite::params;

use crate::database::{Database, format_ts, map_tr_err, parse_ts};

/// Append a stamped record to its stream's table. Returns the new record id.
pub async fn append(db: &Database, entry: &StampedAuditRecord) -> Result<String, CourierError> {
    let id = uuid::Uuid::new_v4().to_string();
    let metadata = serde_json::to_string(&entry.record.metadata).map_err(CourierError::storage)?;
    let sql = format!(
        "INSERT INTO {} (id, action, performed_by, provider, duration_ms, error_message,
             metadata, server_timestamp, user_agent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        entry.stream.collection()
    );
    let record = entry.record.clone();
    let stamped_at = format_ts(entry.server_timestamp);
    let user_agent = entry.user_agent.clone();
    let row_id = id.clone();

    db.connection()
        .call(move |conn| {
            conn.execute(
                &sql,
                params![
                    row_id,
                    record.action,
                    record.performed_by,
                    record.provider,
                    record.duration_ms.map(|ms| ms as i64),
                    record.error_message,
                    metadata,
                    stamped_at,
                    user_agent,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(id)
}

/// All records of a stream in insertion order.
pub async fn list(
    db: &Database,
    stream: AuditStream,
) -> Result<Vec<StampedAuditRecord>, CourierError> {
    let sql = format!(
        "SELECT action, performed_by, provider, duration_ms, error_message, metadata,
                server_timestamp, user_agent
         FROM {} ORDER BY seq ASC",
        stream.collection()
    );
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| {
                let metadata_raw: String = row.get(5)?;
                let metadata = serde_json::from_str(&metadata_raw).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                let duration_ms: Option<i64> = row.get(3)?;
                Ok(StampedAuditRecord {
                    stream,
                    record: AuditRecord {
                        action: row.get(0)?,
                        performed_by: row.get(1)?,
                        provider: row.get(2)?,
                        duration_ms: duration_ms.map(|ms| ms as u64),
                        error_message: row.get(4)?,
                        metadata,
                    },
                    server_timestamp: parse_ts(6, &row.get::<_, String>(6)?)?,
                    user_agent: row.get(7)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn streams_are_separate_and_ordered() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("a.db").to_str().unwrap())
            .await
            .unwrap();

        for action in ["send_attempt_failed", "send_success"] {
            let entry = StampedAuditRecord {
                stream: AuditStream::Mail,
                record: AuditRecord::new(action).provider("p1").duration_ms(12),
                server_timestamp: Utc::now(),
                user_agent: "server-cron".to_string(),
            };
            let id = append(&db, &entry).await.unwrap();
            assert!(!id.is_empty());
        }
        let invite = StampedAuditRecord {
            stream: AuditStream::Action,
            record: AuditRecord::new("invite_sent").performed_by("u1").sampled(true),
            server_timestamp: Utc::now(),
            user_agent: "server-cron".to_string(),
        };
        append(&db, &invite).await.unwrap();

        let mail = list(&db, AuditStream::Mail).await.unwrap();
        let actions: Vec<_> = mail.iter().map(|r| r.record.action.as_str()).collect();
        assert_eq!(actions, vec!["send_attempt_failed", "send_success"]);
        assert_eq!(mail[1].record.duration_ms, Some(12));

        let actions = list(&db, AuditStream::Action).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert!(actions[0].record.should_sample());
        db.close().await.unwrap();
    }
}
