// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Claims one reminder and delivers it with failover across providers.
//!
//! Per item: claim (`Pending -> InFlight`), filter providers by today's
//! quota, try them in registry order, then settle to `Sent` or `Failed`.
//! Every attempt, the delivered one included, and the final outcome go to
//! the mail audit stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use courier_audit::AuditHandle;
use courier_config::model::DispatchConfig;
use courier_core::{
    AuditRecord, AuditStream, CourierError, DeliveryTransport, DispatchResult, OutboundEmail,
    ProviderConfig, QuotaLedger, ReminderState, ReminderStore, ReminderWorkItem,
};

use crate::recording;
use crate::registry::ProviderRegistry;

/// Error recorded when every provider was filtered out before trying.
pub const NO_ELIGIBLE_PROVIDER: &str = "no eligible provider";

/// A provider that accepted the email on this attempt.
struct Delivered<'a> {
    provider: &'a ProviderConfig,
    day: NaiveDate,
    duration_ms: u64,
    attempt: usize,
}

pub struct DispatchEngine {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn ReminderStore>,
    quota: Arc<dyn QuotaLedger>,
    audit: AuditHandle,
    transports: HashMap<String, Arc<dyn DeliveryTransport>>,
    default_transport: Option<Arc<dyn DeliveryTransport>>,
    send_timeout: Duration,
}

impl DispatchEngine {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn ReminderStore>,
        quota: Arc<dyn QuotaLedger>,
        audit: AuditHandle,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            registry,
            store,
            quota,
            audit,
            transports: HashMap::new(),
            default_transport: None,
            send_timeout: Duration::from_secs(config.send_timeout_secs),
        }
    }

    /// Use `transport` for the provider with id `provider_id`.
    pub fn with_transport(
        mut self,
        provider_id: impl Into<String>,
        transport: Arc<dyn DeliveryTransport>,
    ) -> Self {
        self.transports.insert(provider_id.into(), transport);
        self
    }

    /// Use `transport` for every provider without a dedicated one.
    pub fn with_default_transport(mut self, transport: Arc<dyn DeliveryTransport>) -> Self {
        self.default_transport = Some(transport);
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    /// Dispatch one work item.
    ///
    /// Returns `Skipped` when the claim is lost. Delivery failures never
    /// surface as `Err`; only store failures raised before any provider
    /// accepted the email do, after the item has been released back to
    /// `Pending` on a best-effort basis. Once a provider accepts, the result
    /// is `Sent` and the claim is never released.
    pub async fn dispatch(&self, item: &ReminderWorkItem) -> Result<DispatchResult, CourierError> {
        let claimed = self
            .store
            .compare_and_set_state(&item.id, ReminderState::Pending, ReminderState::InFlight)
            .await?;
        if !claimed {
            debug!(reminder = %item.id, "claim lost, skipping");
            return Ok(DispatchResult::Skipped);
        }

        match self.deliver_claimed(item).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(reminder = %item.id, error = %e, "dispatch aborted, releasing claim");
                if let Err(release_err) = self
                    .store
                    .compare_and_set_state(&item.id, ReminderState::InFlight, ReminderState::Pending)
                    .await
                {
                    warn!(reminder = %item.id, error = %release_err, "failed to release claim");
                }
                Err(e)
            }
        }
    }

    async fn eligible_providers(&self, day: NaiveDate) -> Result<Vec<&ProviderConfig>, CourierError> {
        let mut eligible = Vec::new();
        for provider in self.registry.list_providers() {
            let sent = self.quota.sends_on(&provider.id, day).await?;
            if sent < provider.daily_quota {
                eligible.push(provider);
            } else {
                debug!(provider = %provider.id, sent, quota = provider.daily_quota, "quota exhausted");
            }
        }
        Ok(eligible)
    }

    async fn deliver_claimed(&self, item: &ReminderWorkItem) -> Result<DispatchResult, CourierError> {
        let today = Utc::now().date_naive();
        let email = OutboundEmail::from(item);
        let mut last_error = NO_ELIGIBLE_PROVIDER.to_string();

        for (index, provider) in self.eligible_providers(today).await?.into_iter().enumerate() {
            let started = Instant::now();
            let outcome = self.try_provider(provider, &email).await;
            let duration_ms = started.elapsed().as_millis() as u64;
            let attempt = index + 1;

            match outcome {
                Ok(()) => {
                    let delivered = Delivered {
                        provider,
                        day: today,
                        duration_ms,
                        attempt,
                    };
                    return Ok(self.settle_delivered(item, delivered).await);
                }
                Err(e) => {
                    let message = e.to_string();
                    self.store
                        .record_attempt(&item.id, &provider.id, Some(&message))
                        .await?;
                    self.audit
                        .submit_critical(
                            AuditStream::Mail,
                            AuditRecord::new("send_attempt_failed")
                                .provider(&provider.id)
                                .duration_ms(duration_ms)
                                .error(&message)
                                .meta("reminder_id", item.id.as_str())
                                .meta("attempt", attempt),
                        )
                        .await;
                    warn!(
                        reminder = %item.id,
                        provider = %provider.id,
                        error = %message,
                        "provider attempt failed, trying next"
                    );
                    last_error = message;
                }
            }
        }

        self.store
            .compare_and_set_state(&item.id, ReminderState::InFlight, ReminderState::Failed)
            .await?;
        self.audit
            .submit_critical(
                AuditStream::Mail,
                AuditRecord::new("send_exhausted")
                    .error(&last_error)
                    .meta("reminder_id", item.id.as_str())
                    .sampled(false),
            )
            .await;
        recording::record_exhausted();
        warn!(reminder = %item.id, error = %last_error, "all providers exhausted");
        Ok(DispatchResult::Failed { last_error })
    }

    /// Bookkeeping after a provider accepted the email.
    ///
    /// The email is out: nothing here may fail the dispatch or hand the item
    /// back to `Pending`. The state settles first, then the attempt, quota
    /// and audit writes follow and are only logged when they fail.
    async fn settle_delivered(&self, item: &ReminderWorkItem, sent: Delivered<'_>) -> DispatchResult {
        let provider = &sent.provider.id;
        let settled = match self
            .store
            .compare_and_set_state(&item.id, ReminderState::InFlight, ReminderState::Sent)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                warn!(reminder = %item.id, %provider, "claim lost before settling, item not marked sent");
                false
            }
            Err(e) => {
                error!(reminder = %item.id, %provider, error = %e, "failed to mark delivered item sent");
                false
            }
        };

        if let Err(e) = self.store.record_attempt(&item.id, provider, None).await {
            warn!(reminder = %item.id, %provider, error = %e, "failed to record delivered attempt");
        }
        if let Err(e) = self.quota.record_send(provider, sent.day).await {
            warn!(%provider, error = %e, "failed to count send against quota");
        }

        self.audit
            .submit_critical(
                AuditStream::Mail,
                AuditRecord::new("send_attempt_delivered")
                    .provider(provider)
                    .duration_ms(sent.duration_ms)
                    .meta("reminder_id", item.id.as_str())
                    .meta("attempt", sent.attempt),
            )
            .await;
        let mut outcome = AuditRecord::new("send_success")
            .provider(provider)
            .duration_ms(sent.duration_ms)
            .meta("reminder_id", item.id.as_str())
            .meta("attempt", sent.attempt);
        if !settled {
            outcome = outcome.meta("settled", false);
        }
        self.audit.submit_critical(AuditStream::Mail, outcome).await;

        recording::record_sent(provider);
        info!(reminder = %item.id, %provider, duration_ms = sent.duration_ms, settled, "reminder sent");
        DispatchResult::Sent {
            provider_id: provider.clone(),
        }
    }

    async fn try_provider(
        &self,
        provider: &ProviderConfig,
        email: &OutboundEmail,
    ) -> Result<(), CourierError> {
        let Some(transport) = self
            .transports
            .get(&provider.id)
            .or(self.default_transport.as_ref())
        else {
            return Err(CourierError::Delivery {
                provider: provider.id.clone(),
                message: "no transport registered".to_string(),
            });
        };

        match tokio::time::timeout(self.send_timeout, transport.send(provider, email)).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(CourierError::Timeout {
                duration: self.send_timeout,
            }),
        }
    }
}
