// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementation of the store traits.
//!
//! Mirrors the SQLite semantics (atomic compare-and-set, oldest-due-first
//! listing) and adds failure switches and call counters for assertions.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use courier_core::{
    AuditStore, AuditStream, CourierError, QuotaLedger, ReminderState, ReminderStore,
    ReminderWorkItem, StampedAuditRecord,
};

#[derive(Default)]
struct Inner {
    reminders: BTreeMap<String, ReminderWorkItem>,
    quota: HashMap<(String, NaiveDate), u32>,
    audit: Vec<StampedAuditRecord>,
}

/// Process-local store for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_audit: AtomicBool,
    fail_attempts: AtomicBool,
    list_due_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `append` fail with a storage error.
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Make every `record_attempt` fail with a storage error.
    pub fn fail_record_attempt(&self, fail: bool) {
        self.fail_attempts.store(fail, Ordering::SeqCst);
    }

    /// Insert many reminders at once.
    pub async fn seed(&self, items: impl IntoIterator<Item = ReminderWorkItem>) {
        let mut inner = self.inner.lock().await;
        for item in items {
            inner.reminders.insert(item.id.clone(), item);
        }
    }

    /// Current copy of a reminder.
    pub async fn reminder(&self, id: &str) -> Option<ReminderWorkItem> {
        self.inner.lock().await.reminders.get(id).cloned()
    }

    /// Every persisted audit entry, in append order.
    pub async fn audit_entries(&self) -> Vec<StampedAuditRecord> {
        self.inner.lock().await.audit.clone()
    }

    /// Persisted entries of one stream with the given action.
    pub async fn audit_actions(&self, stream: AuditStream, action: &str) -> Vec<StampedAuditRecord> {
        self.inner
            .lock()
            .await
            .audit
            .iter()
            .filter(|e| e.stream == stream && e.record.action == action)
            .cloned()
            .collect()
    }

    /// How many times `list_due` was called.
    pub fn list_due_calls(&self) -> usize {
        self.list_due_calls.load(Ordering::SeqCst)
    }

    /// Set the quota counter directly.
    pub async fn set_sends(&self, provider_id: &str, day: NaiveDate, sends: u32) {
        self.inner
            .lock()
            .await
            .quota
            .insert((provider_id.to_string(), day), sends);
    }
}

fn injected(what: &str) -> CourierError {
    CourierError::Storage {
        source: format!("injected {what} failure").into(),
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn insert_reminder(&self, item: &ReminderWorkItem) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        if inner.reminders.contains_key(&item.id) {
            return Err(CourierError::Storage {
                source: format!("reminder `{}` already exists", item.id).into(),
            });
        }
        inner.reminders.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn get_reminder(&self, id: &str) -> Result<Option<ReminderWorkItem>, CourierError> {
        Ok(self.reminder(id).await)
    }

    async fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ReminderWorkItem>, CourierError> {
        self.list_due_calls.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().await;
        let mut due: Vec<_> = inner
            .reminders
            .values()
            .filter(|r| r.is_due(now))
            .cloned()
            .collect();
        due.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
        due.truncate(limit);
        Ok(due)
    }

    async fn compare_and_set_state(
        &self,
        id: &str,
        expected: ReminderState,
        next: ReminderState,
    ) -> Result<bool, CourierError> {
        let mut inner = self.inner.lock().await;
        let Some(item) = inner.reminders.get_mut(id) else {
            return Ok(false);
        };
        if item.state != expected {
            return Ok(false);
        }
        let now = Utc::now();
        item.state = next;
        item.updated_at = now;
        match next {
            ReminderState::InFlight => item.claimed_at = Some(now),
            ReminderState::Pending => item.claimed_at = None,
            _ => {}
        }
        Ok(true)
    }

    async fn record_attempt(
        &self,
        id: &str,
        provider_id: &str,
        error: Option<&str>,
    ) -> Result<(), CourierError> {
        if self.fail_attempts.load(Ordering::SeqCst) {
            return Err(injected("record_attempt"));
        }
        let mut inner = self.inner.lock().await;
        if let Some(item) = inner.reminders.get_mut(id) {
            item.attempt_count += 1;
            item.last_provider = Some(provider_id.to_string());
            item.last_error = error.map(str::to_string);
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reclaim_stale(&self, claimed_before: DateTime<Utc>) -> Result<u64, CourierError> {
        let mut inner = self.inner.lock().await;
        let mut reclaimed = 0;
        for item in inner.reminders.values_mut() {
            if item.state == ReminderState::InFlight
                && item.claimed_at.is_some_and(|at| at < claimed_before)
            {
                item.state = ReminderState::Pending;
                item.claimed_at = None;
                reclaimed += 1;
            }
        }
        Ok(reclaimed)
    }
}

#[async_trait]
impl QuotaLedger for MemoryStore {
    async fn sends_on(&self, provider_id: &str, day: NaiveDate) -> Result<u32, CourierError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .quota
            .get(&(provider_id.to_string(), day))
            .copied()
            .unwrap_or(0))
    }

    async fn record_send(&self, provider_id: &str, day: NaiveDate) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        *inner.quota.entry((provider_id.to_string(), day)).or_insert(0) += 1;
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: &StampedAuditRecord) -> Result<String, CourierError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(injected("audit append"));
        }
        self.inner.lock().await.audit.push(entry.clone());
        Ok(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::due_reminder;

    #[tokio::test]
    async fn cas_matches_sqlite_semantics() {
        let store = MemoryStore::new();
        store.seed([due_reminder("r1")]).await;

        assert!(
            store
                .compare_and_set_state("r1", ReminderState::Pending, ReminderState::InFlight)
                .await
                .unwrap()
        );
        assert!(
            !store
                .compare_and_set_state("r1", ReminderState::Pending, ReminderState::InFlight)
                .await
                .unwrap()
        );
        assert!(store.reminder("r1").await.unwrap().claimed_at.is_some());
        assert!(store.list_due(Utc::now(), 10).await.unwrap().is_empty());
        assert_eq!(store.list_due_calls(), 1);
    }

    #[tokio::test]
    async fn audit_failure_switch() {
        let store = MemoryStore::new();
        store.fail_audit_writes(true);
        let entry = StampedAuditRecord {
            stream: AuditStream::Mail,
            record: courier_core::AuditRecord::new("x"),
            server_timestamp: Utc::now(),
            user_agent: "test".to_string(),
        };
        assert!(store.append(&entry).await.is_err());
        store.fail_audit_writes(false);
        assert!(store.append(&entry).await.is_ok());
        assert_eq!(store.audit_entries().await.len(), 1);
    }
}
