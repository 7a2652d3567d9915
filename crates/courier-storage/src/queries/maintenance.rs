// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk maintenance operations for development environments.

use courier_core::CourierError;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::database::{Database, map_tr_err};

/// A named collection that can be bulk-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Reminders,
    InviteLogs,
    MailLogs,
    ProviderQuota,
}

impl Collection {
    fn table(self) -> &'static str {
        match self {
            Self::Reminders => "reminders",
            Self::InviteLogs => "invite_logs",
            Self::MailLogs => "mail_logs",
            Self::ProviderQuota => "provider_quota",
        }
    }
}

/// Delete every row of `collection`. Returns the number of rows removed.
pub async fn wipe_collection(db: &Database, collection: Collection) -> Result<u64, CourierError> {
    let sql = format!("DELETE FROM {}", collection.table());
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(&sql, [])?;
            Ok(removed as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Row counts per collection, for operator tooling.
pub async fn collection_counts(db: &Database) -> Result<Value, CourierError> {
    use strum::IntoEnumIterator;

    let tables: Vec<(String, &'static str)> = Collection::iter()
        .map(|c| (c.to_string(), c.table()))
        .collect();
    db.connection()
        .call(move |conn| {
            let mut counts = serde_json::Map::new();
            for (name, table) in tables {
                let n: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
                counts.insert(name, Value::from(n));
            }
            Ok(Value::Object(counts))
        })
        .await
        .map_err(map_tr_err)
}
