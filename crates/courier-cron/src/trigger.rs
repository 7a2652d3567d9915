// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One processing run: reclaim, enumerate, dispatch with bounded parallelism.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::{StreamExt, future, stream};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{error, info, warn};

use courier_config::model::CronConfig;
use courier_core::{CourierError, ReminderStore, RunSummary};
use courier_dispatch::DispatchEngine;

pub struct ReminderTrigger {
    store: Arc<dyn ReminderStore>,
    engine: Arc<DispatchEngine>,
    run_lock: Mutex<()>,
    batch_size: usize,
    concurrency: usize,
    run_timeout: Duration,
    stale_after: chrono::Duration,
}

impl ReminderTrigger {
    pub fn new(
        store: Arc<dyn ReminderStore>,
        engine: Arc<DispatchEngine>,
        config: &CronConfig,
    ) -> Self {
        Self {
            store,
            engine,
            run_lock: Mutex::new(()),
            batch_size: config.batch_size.max(1),
            concurrency: config.concurrency.max(1),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            stale_after: i64::try_from(config.stale_after_secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Process reminders due at `now`.
    ///
    /// A call made while another run of this trigger is active returns an
    /// all-zero summary without touching the store.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<RunSummary, CourierError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            info!("reminder run already in progress, skipping");
            return Ok(RunSummary::default());
        };

        let deadline = Instant::now() + self.run_timeout;
        let result = self.run(now, deadline).await;
        self.engine.audit().flush().await;

        match &result {
            Ok(summary) => info!(
                processed = summary.processed,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "reminder run complete"
            ),
            Err(e) => error!(error = %e, "reminder run aborted"),
        }
        result
    }

    async fn run(&self, now: DateTime<Utc>, deadline: Instant) -> Result<RunSummary, CourierError> {
        let stale_before = now
            .checked_sub_signed(self.stale_after)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let reclaimed = self.store.reclaim_stale(stale_before).await?;
        if reclaimed > 0 {
            warn!(reclaimed, "returned stale claims to pending");
        }

        let due = self.store.list_due(now, self.batch_size).await?;
        let total = due.len();

        let halted = AtomicBool::new(false);
        let mut started = 0usize;
        let mut summary = RunSummary::default();
        let mut first_error = None;

        let mut results = stream::iter(due)
            .take_while(|_| {
                let open = !halted.load(Ordering::SeqCst) && Instant::now() < deadline;
                future::ready(open)
            })
            .map(|item| {
                started += 1;
                let engine = &self.engine;
                async move { engine.dispatch(&item).await }
            })
            .buffer_unordered(self.concurrency);

        while let Some(result) = results.next().await {
            match result {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    halted.store(true, Ordering::SeqCst);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        drop(results);

        if started < total && first_error.is_none() {
            warn!(
                started,
                left_pending = total - started,
                "run deadline reached before all due reminders started"
            );
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_audit::{AuditHandle, AuditSink, Sampler};
    use courier_config::model::DispatchConfig;
    use courier_dispatch::ProviderRegistry;
    use courier_test_utils::fixtures::{due_reminder, provider};
    use courier_test_utils::{MemoryStore, MockTransport, Outcome};

    fn trigger(store: &Arc<MemoryStore>, config: &CronConfig) -> ReminderTrigger {
        trigger_with(store, config, Arc::new(MockTransport::new()))
    }

    fn trigger_with(
        store: &Arc<MemoryStore>,
        config: &CronConfig,
        transport: Arc<MockTransport>,
    ) -> ReminderTrigger {
        let sink = Arc::new(AuditSink::with_sampler(
            store.clone(),
            Sampler::new(1.0),
            "server-cron",
        ));
        let (audit, _writer) = AuditHandle::spawn(sink, 64);
        let engine = DispatchEngine::new(
            Arc::new(ProviderRegistry::from_configs(vec![provider("p1", 1, 100)])),
            store.clone(),
            store.clone(),
            audit,
            &DispatchConfig::default(),
        )
        .with_default_transport(transport);
        ReminderTrigger::new(store.clone(), Arc::new(engine), config)
    }

    #[tokio::test]
    async fn empty_store_yields_zero_summary() {
        let store = Arc::new(MemoryStore::new());
        let summary = trigger(&store, &CronConfig::default())
            .process_due(Utc::now())
            .await
            .unwrap();
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn batch_size_caps_enumeration() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed((0..5).map(|i| due_reminder(&format!("r{i}"))))
            .await;
        let config = CronConfig {
            batch_size: 2,
            ..CronConfig::default()
        };

        let summary = trigger(&store, &config).process_due(Utc::now()).await.unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.succeeded, 2);
    }

    #[tokio::test]
    async fn store_error_is_returned() {
        let store = Arc::new(MemoryStore::new());
        store.seed([due_reminder("r1"), due_reminder("r2")]).await;
        store.fail_record_attempt(true);
        let transport = Arc::new(MockTransport::new());
        transport.always("p1", Outcome::Fail("down".into())).await;
        let config = CronConfig {
            concurrency: 1,
            ..CronConfig::default()
        };

        let err = trigger_with(&store, &config, transport)
            .process_due(Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Storage { .. }));
    }
}
