// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The audit sink: stamp, sample, persist, and never fail the caller.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use courier_config::model::AuditConfig;
use courier_core::{AuditRecord, AuditStore, AuditStream, StampedAuditRecord};

use crate::recording::AUDIT_SAMPLED_TOTAL;
use crate::sampler::Sampler;

/// Result of one `record` call. Callers may ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditReceipt {
    /// Written; carries the store-assigned id.
    Persisted(String),
    /// Skipped by sampling.
    Sampled,
    /// The store rejected the write. Already logged.
    Failed,
}

impl AuditReceipt {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }
}

pub struct AuditSink {
    store: Arc<dyn AuditStore>,
    sampler: Sampler,
    user_agent: String,
    last_stamp: Mutex<DateTime<Utc>>,
}

impl AuditSink {
    pub fn new(store: Arc<dyn AuditStore>, config: &AuditConfig) -> Self {
        Self::with_sampler(store, Sampler::new(config.sample_rate), &config.user_agent)
    }

    pub fn with_sampler(store: Arc<dyn AuditStore>, sampler: Sampler, user_agent: &str) -> Self {
        Self {
            store,
            sampler,
            user_agent: user_agent.to_string(),
            last_stamp: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Persist `record` to `stream`, subject to sampling.
    ///
    /// Only records whose metadata carries `shouldSample: true` are sampled;
    /// every other record is always written.
    pub async fn record(&self, stream: AuditStream, record: AuditRecord) -> AuditReceipt {
        if record.should_sample() && !self.sampler.keep() {
            metrics::counter!(AUDIT_SAMPLED_TOTAL).increment(1);
            debug!(%stream, action = %record.action, "audit record skipped by sampling");
            return AuditReceipt::Sampled;
        }

        let entry = StampedAuditRecord {
            stream,
            server_timestamp: self.stamp(),
            user_agent: self.user_agent.clone(),
            record,
        };

        match self.store.append(&entry).await {
            Ok(id) => AuditReceipt::Persisted(id),
            Err(e) => {
                warn!(
                    %stream,
                    action = %entry.record.action,
                    error = %e,
                    "failed to persist audit record"
                );
                AuditReceipt::Failed
            }
        }
    }

    /// `max(now, previous stamp)`, so stamps never go backwards.
    fn stamp(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now().max(*last);
        *last = now;
        now
    }
}
