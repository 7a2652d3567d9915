// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end failover behaviour of the dispatch engine.

use std::sync::Arc;

use courier_audit::{AuditHandle, AuditSink, Sampler};
use courier_config::model::DispatchConfig;
use courier_core::{AuditStream, DispatchResult, ReminderState};
use courier_dispatch::{DispatchEngine, ProviderRegistry};
use courier_test_utils::fixtures::{due_reminder, provider};
use courier_test_utils::{MemoryStore, MockTransport, Outcome};

struct Harness {
    store: Arc<MemoryStore>,
    transport: Arc<MockTransport>,
    engine: DispatchEngine,
}

fn harness(ids: &[(&str, i32)]) -> Harness {
    harness_with_queue(ids, 128)
}

fn harness_with_queue(ids: &[(&str, i32)], audit_capacity: usize) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(MockTransport::new());
    let sink = Arc::new(AuditSink::with_sampler(
        store.clone(),
        Sampler::new(0.1),
        "server-cron",
    ));
    let (audit, _writer) = AuditHandle::spawn(sink, audit_capacity);
    let providers = ids.iter().map(|(id, prio)| provider(id, *prio, 100)).collect();
    let engine = DispatchEngine::new(
        Arc::new(ProviderRegistry::from_configs(providers)),
        store.clone(),
        store.clone(),
        audit,
        &DispatchConfig::default(),
    )
    .with_default_transport(transport.clone());
    Harness {
        store,
        transport,
        engine,
    }
}

#[tokio::test]
async fn first_fails_second_succeeds_in_priority_order() {
    let h = harness(&[("p2", 2), ("p1", 1)]);
    h.transport
        .script("p1", [Outcome::Fail("rate limited".into())])
        .await;
    h.store.seed([due_reminder("r1")]).await;

    let result = h.engine.dispatch(&due_reminder("r1")).await.unwrap();
    assert_eq!(
        result,
        DispatchResult::Sent {
            provider_id: "p2".into()
        }
    );

    let order: Vec<_> = h.transport.calls().await.into_iter().map(|(p, _)| p).collect();
    assert_eq!(order, vec!["p1", "p2"]);
}

#[tokio::test]
async fn three_provider_example() {
    let h = harness(&[("a", 1), ("b", 2), ("c", 3)]);
    h.transport.script("a", [Outcome::Fail("500".into())]).await;
    h.transport.script("b", [Outcome::Fail("timeout".into())]).await;
    h.store.seed([due_reminder("r1")]).await;

    let result = h.engine.dispatch(&due_reminder("r1")).await.unwrap();
    assert_eq!(
        result,
        DispatchResult::Sent {
            provider_id: "c".into()
        }
    );
    h.engine.audit().flush().await;

    let item = h.store.reminder("r1").await.unwrap();
    assert_eq!(item.state, ReminderState::Sent);
    assert_eq!(item.attempt_count, 3);

    let entries = h.store.audit_entries().await;
    let actions: Vec<_> = entries.iter().map(|e| e.record.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "send_attempt_failed",
            "send_attempt_failed",
            "send_attempt_delivered",
            "send_success"
        ]
    );
    assert!(entries.iter().all(|e| e.stream == AuditStream::Mail));
    let providers: Vec<_> = entries
        .iter()
        .map(|e| e.record.provider.as_deref())
        .collect();
    assert_eq!(providers, vec![Some("a"), Some("b"), Some("c"), Some("c")]);
}

#[tokio::test]
async fn exhaustion_writes_exactly_one_outcome_record() {
    let h = harness(&[("a", 1), ("b", 2)]);
    h.transport.always("a", Outcome::Fail("down".into())).await;
    h.transport.always("b", Outcome::Fail("also down".into())).await;
    h.store.seed([due_reminder("r1")]).await;

    let result = h.engine.dispatch(&due_reminder("r1")).await.unwrap();
    assert_eq!(
        result,
        DispatchResult::Failed {
            last_error: "delivery via `b` failed: also down".into()
        }
    );
    h.engine.audit().flush().await;

    let exhausted = h
        .store
        .audit_actions(AuditStream::Mail, "send_exhausted")
        .await;
    assert_eq!(exhausted.len(), 1);
    assert_eq!(
        exhausted[0].record.metadata.get("shouldSample"),
        Some(&serde_json::Value::Bool(false))
    );
    assert_eq!(
        h.store.reminder("r1").await.unwrap().state,
        ReminderState::Failed
    );
}

#[tokio::test]
async fn full_audit_queue_never_drops_outcome_records() {
    let h = harness_with_queue(&[("a", 1), ("b", 2)], 1);
    h.transport.always("a", Outcome::Fail("down".into())).await;
    h.transport.always("b", Outcome::Fail("also down".into())).await;
    h.store.seed([due_reminder("r1")]).await;

    let result = h.engine.dispatch(&due_reminder("r1")).await.unwrap();
    assert!(matches!(result, DispatchResult::Failed { .. }));
    h.engine.audit().flush().await;

    let actions: Vec<_> = h
        .store
        .audit_entries()
        .await
        .into_iter()
        .map(|e| e.record.action)
        .collect();
    assert_eq!(
        actions,
        vec!["send_attempt_failed", "send_attempt_failed", "send_exhausted"]
    );
    assert_eq!(
        h.store
            .audit_actions(AuditStream::Mail, "send_exhausted")
            .await
            .len(),
        1
    );
}

#[tokio::test]
async fn audit_outage_does_not_fail_dispatch() {
    let h = harness(&[("a", 1)]);
    h.store.fail_audit_writes(true);
    h.store.seed([due_reminder("r1")]).await;

    let result = h.engine.dispatch(&due_reminder("r1")).await.unwrap();
    h.engine.audit().flush().await;

    assert!(matches!(result, DispatchResult::Sent { .. }));
    assert!(h.store.audit_entries().await.is_empty());
    assert_eq!(
        h.store.reminder("r1").await.unwrap().state,
        ReminderState::Sent
    );
}

#[tokio::test]
async fn second_dispatch_of_same_item_is_skipped() {
    let h = harness(&[("a", 1)]);
    h.store.seed([due_reminder("r1")]).await;
    let item = due_reminder("r1");

    let first = h.engine.dispatch(&item).await.unwrap();
    let second = h.engine.dispatch(&item).await.unwrap();
    assert!(matches!(first, DispatchResult::Sent { .. }));
    assert_eq!(second, DispatchResult::Skipped);
    assert_eq!(h.transport.sends_for("r1").await, 1);
}
