// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder work-item queries.
//!
//! State changes are conditional single-row updates; the affected-row count
//! decides whether a compare-and-set won.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use courier_core::{CourierError, ReminderState, ReminderWorkItem};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, format_ts, map_tr_err, parse_ts};

const COLUMNS: &str = "id, recipient, recipient_name, template_params, due_at, state,
    attempt_count, claimed_at, last_provider, last_error, created_at, updated_at";

fn row_to_item(row: &Row<'_>) -> Result<ReminderWorkItem, rusqlite::Error> {
    let params_raw: String = row.get(3)?;
    let template_params = serde_json::from_str(&params_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let state_raw: String = row.get(5)?;
    let state = ReminderState::from_str(&state_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let claimed_at: Option<String> = row.get(7)?;

    Ok(ReminderWorkItem {
        id: row.get(0)?,
        recipient: row.get(1)?,
        recipient_name: row.get(2)?,
        template_params,
        due_at: parse_ts(4, &row.get::<_, String>(4)?)?,
        state,
        attempt_count: row.get(6)?,
        claimed_at: claimed_at.as_deref().map(|s| parse_ts(7, s)).transpose()?,
        last_provider: row.get(8)?,
        last_error: row.get(9)?,
        created_at: parse_ts(10, &row.get::<_, String>(10)?)?,
        updated_at: parse_ts(11, &row.get::<_, String>(11)?)?,
    })
}

/// Insert a new reminder row.
pub async fn insert_reminder(db: &Database, item: &ReminderWorkItem) -> Result<(), CourierError> {
    let item = item.clone();
    let template_params =
        serde_json::to_string(&item.template_params).map_err(CourierError::storage)?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO reminders (id, recipient, recipient_name, template_params, due_at,
                     state, attempt_count, claimed_at, last_provider, last_error,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    item.id,
                    item.recipient,
                    item.recipient_name,
                    template_params,
                    format_ts(item.due_at),
                    item.state.to_string(),
                    item.attempt_count,
                    item.claimed_at.map(format_ts),
                    item.last_provider,
                    item.last_error,
                    format_ts(item.created_at),
                    format_ts(item.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a reminder by id.
pub async fn get_reminder(
    db: &Database,
    id: &str,
) -> Result<Option<ReminderWorkItem>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM reminders WHERE id = ?1"),
                params![id],
                row_to_item,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Pending reminders due at or before `now`, oldest due first.
pub async fn list_due(
    db: &Database,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<ReminderWorkItem>, CourierError> {
    let now = format_ts(now);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM reminders
                 WHERE state = 'pending' AND due_at <= ?1
                 ORDER BY due_at ASC, id ASC
                 LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![now, limit], row_to_item)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Conditional state transition. Returns whether this call performed it.
pub async fn compare_and_set_state(
    db: &Database,
    id: &str,
    expected: ReminderState,
    next: ReminderState,
) -> Result<bool, CourierError> {
    let id = id.to_string();
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE reminders SET
                     state = ?1,
                     claimed_at = CASE
                         WHEN ?1 = 'in_flight' THEN ?4
                         WHEN ?1 = 'pending' THEN NULL
                         ELSE claimed_at END,
                     updated_at = ?4
                 WHERE id = ?2 AND state = ?3",
                params![next.to_string(), id, expected.to_string(), now],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Count one provider attempt against a reminder.
pub async fn record_attempt(
    db: &Database,
    id: &str,
    provider_id: &str,
    error: Option<&str>,
) -> Result<(), CourierError> {
    let id = id.to_string();
    let provider_id = provider_id.to_string();
    let error = error.map(str::to_string);
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE reminders SET
                     attempt_count = attempt_count + 1,
                     last_provider = ?2,
                     last_error = ?3,
                     updated_at = ?4
                 WHERE id = ?1",
                params![id, provider_id, error, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Release abandoned claims back to pending.
pub async fn reclaim_stale(
    db: &Database,
    claimed_before: DateTime<Utc>,
) -> Result<u64, CourierError> {
    let cutoff = format_ts(claimed_before);
    let now = format_ts(Utc::now());
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE reminders SET state = 'pending', claimed_at = NULL, updated_at = ?2
                 WHERE state = 'in_flight' AND claimed_at < ?1",
                params![cutoff, now],
            )?;
            Ok(changed as u64)
        })
        .await
        .map_err(map_tr_err)
}
