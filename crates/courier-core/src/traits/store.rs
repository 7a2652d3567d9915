// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow read/write contracts over the shared document store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::CourierError;
use crate::types::{ReminderState, ReminderWorkItem, StampedAuditRecord};

/// Reminder persistence.
///
/// Every mutating operation is a single atomic per-row update. There is no
/// batch-wide transaction.
#[async_trait]
pub trait ReminderStore: Send + Sync + 'static {
    /// Insert a new reminder. Upstream scheduling owns creation; this exists
    /// for seeding and tests.
    async fn insert_reminder(&self, item: &ReminderWorkItem) -> Result<(), CourierError>;

    /// Fetch a reminder by id.
    async fn get_reminder(&self, id: &str) -> Result<Option<ReminderWorkItem>, CourierError>;

    /// Pending reminders with `due_at <= now`, oldest due first, at most `limit`.
    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ReminderWorkItem>, CourierError>;

    /// Atomically move `id` from `expected` to `next`.
    ///
    /// Returns `false` without touching the row when its current state is not
    /// `expected`. Moving to `InFlight` stamps `claimed_at`; moving back to
    /// `Pending` clears it.
    async fn compare_and_set_state(
        &self,
        id: &str,
        expected: ReminderState,
        next: ReminderState,
    ) -> Result<bool, CourierError>;

    /// Increment `attempt_count` and remember the provider and error of the try.
    async fn record_attempt(
        &self,
        id: &str,
        provider_id: &str,
        error: Option<&str>,
    ) -> Result<(), CourierError>;

    /// Return `InFlight` reminders claimed before `claimed_before` to `Pending`.
    async fn reclaim_stale(&self, claimed_before: DateTime<Utc>) -> Result<u64, CourierError>;
}

/// Per-provider daily send counters.
#[async_trait]
pub trait QuotaLedger: Send + Sync + 'static {
    /// Successful sends recorded for `provider_id` on `day` (UTC).
    async fn sends_on(&self, provider_id: &str, day: NaiveDate) -> Result<u32, CourierError>;

    /// Atomically add one successful send for `provider_id` on `day`.
    async fn record_send(&self, provider_id: &str, day: NaiveDate) -> Result<(), CourierError>;
}

/// Append-only audit log storage.
#[async_trait]
pub trait AuditStore: Send + Sync + 'static {
    /// Append a stamped record to its stream's collection, returning the new id.
    async fn append(&self, entry: &StampedAuditRecord) -> Result<String, CourierError>;
}
