// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier reminder pipeline.
//!
//! This crate provides the domain types, the error type, and the trait seams
//! (store, quota ledger, audit store, delivery transport) that the dispatch
//! engine and trigger are written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use traits::{
    AuditStore, DeliveryReceipt, DeliveryTransport, OutboundEmail, QuotaLedger, ReminderStore,
};
pub use types::{
    AuditRecord, AuditStream, DispatchResult, ProviderConfig, ReminderState, ReminderWorkItem,
    RunSummary, StampedAuditRecord,
};

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::{Duration, Utc};
    use serde_json::json;

    use super::*;

    #[test]
    fn reminder_state_round_trips_through_strings() {
        for state in [
            ReminderState::Pending,
            ReminderState::InFlight,
            ReminderState::Sent,
            ReminderState::Failed,
        ] {
            let s = state.to_string();
            assert_eq!(ReminderState::from_str(&s).unwrap(), state);
        }
        assert_eq!(ReminderState::InFlight.to_string(), "in_flight");
    }

    #[test]
    fn only_sent_and_failed_are_terminal() {
        assert!(!ReminderState::Pending.is_terminal());
        assert!(!ReminderState::InFlight.is_terminal());
        assert!(ReminderState::Sent.is_terminal());
        assert!(ReminderState::Failed.is_terminal());
    }

    #[test]
    fn should_sample_defaults_to_false() {
        assert!(!AuditRecord::new("provider_selected").should_sample());
        assert!(AuditRecord::new("provider_selected").sampled(true).should_sample());
        assert!(!AuditRecord::new("send_exhausted").sampled(false).should_sample());
        let odd = AuditRecord::new("x").meta("shouldSample", "yes");
        assert!(!odd.should_sample());
    }

    #[test]
    fn audit_streams_map_to_collections() {
        assert_eq!(AuditStream::Action.collection(), "invite_logs");
        assert_eq!(AuditStream::Mail.collection(), "mail_logs");
    }

    #[test]
    fn is_due_requires_pending_and_past_due() {
        let now = Utc::now();
        let mut item = ReminderWorkItem::pending("r1", "a@example.com", json!({}), now);
        assert!(item.is_due(now));
        item.due_at = now + Duration::seconds(5);
        assert!(!item.is_due(now));
        item.due_at = now;
        item.state = ReminderState::InFlight;
        assert!(!item.is_due(now));
    }

    #[test]
    fn run_summary_ignores_skipped() {
        let mut summary = RunSummary::default();
        summary.record(&DispatchResult::Sent {
            provider_id: "p1".into(),
        });
        summary.record(&DispatchResult::Failed {
            last_error: "boom".into(),
        });
        summary.record(&DispatchResult::Skipped);
        assert_eq!(
            summary,
            RunSummary {
                processed: 2,
                succeeded: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn provider_debug_redacts_credentials() {
        let provider: ProviderConfig = serde_json::from_value(json!({
            "id": "primary",
            "name": "Primary",
            "service_id": "svc",
            "template_id": "tpl",
            "private_key": "super-secret-token",
        }))
        .unwrap();
        let debug = format!("{provider:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[redacted]"));
        assert_eq!(provider.endpoint, types::DEFAULT_PROVIDER_ENDPOINT);
    }

    #[test]
    fn transient_errors_are_delivery_and_timeout() {
        assert!(
            CourierError::Delivery {
                provider: "p".into(),
                message: "503".into()
            }
            .is_transient()
        );
        assert!(
            CourierError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_transient()
        );
        assert!(!CourierError::Internal("x".into()).is_transient());
    }
}
