// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process periodic trigger driven by a cron expression.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use courier_core::CourierError;

use crate::trigger::ReminderTrigger;

pub struct CronRunner {
    trigger: Arc<ReminderTrigger>,
    schedule: Cron,
    expression: String,
    cancel: CancellationToken,
}

impl CronRunner {
    /// Parse `expression` (five-field cron syntax) and bind it to `trigger`.
    pub fn new(
        trigger: Arc<ReminderTrigger>,
        expression: &str,
        cancel: CancellationToken,
    ) -> Result<Self, CourierError> {
        let schedule = parse_schedule(expression)?;
        Ok(Self {
            trigger,
            schedule,
            expression: expression.to_string(),
            cancel,
        })
    }

    /// First scheduled instant strictly after `after`.
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, CourierError> {
        self.schedule
            .find_next_occurrence(&after, false)
            .map_err(|e| CourierError::Internal(format!("no next run for `{}`: {e}", self.expression)))
    }

    /// Run until the cancellation token fires.
    pub async fn run(self) {
        info!(schedule = %self.expression, "cron runner started");
        loop {
            let next = match self.next_run_after(Utc::now()) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "cron runner stopping");
                    break;
                }
            };
            let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            debug!(next = %next, "next reminder run scheduled");

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = self.trigger.process_due(Utc::now()).await {
                        error!(error = %e, "scheduled reminder run failed");
                    }
                }
            }
        }
        info!("cron runner stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Validate a cron expression.
pub fn parse_schedule(expression: &str) -> Result<Cron, CourierError> {
    Cron::from_str(expression)
        .map_err(|e| CourierError::Config(format!("invalid cron.schedule `{expression}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use courier_audit::{AuditHandle, AuditSink, Sampler};
    use courier_config::model::{CronConfig, DispatchConfig};
    use courier_dispatch::{DispatchEngine, ProviderRegistry};
    use courier_test_utils::MemoryStore;

    fn trigger() -> Arc<ReminderTrigger> {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(AuditSink::with_sampler(
            store.clone(),
            Sampler::new(1.0),
            "server-cron",
        ));
        let (audit, _writer) = AuditHandle::spawn(sink, 8);
        let engine = DispatchEngine::new(
            Arc::new(ProviderRegistry::default()),
            store.clone(),
            store.clone(),
            audit,
            &DispatchConfig::default(),
        );
        Arc::new(ReminderTrigger::new(
            store,
            Arc::new(engine),
            &CronConfig::default(),
        ))
    }

    #[test]
    fn rejects_invalid_expression() {
        let err = parse_schedule("every five minutes").unwrap_err();
        assert!(matches!(err, CourierError::Config(_)));
    }

    #[tokio::test]
    async fn computes_next_run() {
        let runner = CronRunner::new(trigger(), "*/5 * * * *", CancellationToken::new()).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 4, 2, 10, 2, 30).unwrap();
        let next = runner.next_run_after(at).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 4, 2, 10, 5, 0).unwrap());
    }

    #[tokio::test]
    async fn stops_on_cancellation() {
        let cancel = CancellationToken::new();
        let runner = CronRunner::new(trigger(), "0 0 1 1 *", cancel.clone()).unwrap();
        let handle = runner.spawn();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("runner should stop")
            .unwrap();
    }
}
