// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted delivery transport for deterministic dispatch tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{
    CourierError, DeliveryReceipt, DeliveryTransport, OutboundEmail, ProviderConfig,
};

/// What one scripted send does.
#[derive(Debug, Clone)]
pub enum Outcome {
    Deliver,
    Fail(String),
    /// Sleep before delivering; pairs with the engine's send timeout.
    Hang(Duration),
}

/// A transport whose answers are queued per provider id.
///
/// Once a provider's queue is empty it uses that provider's fallback
/// outcome (set with [`MockTransport::always`]) or delivers.
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    fallback: Mutex<HashMap<String, Outcome>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for the next sends through `provider_id`.
    pub async fn script(&self, provider_id: &str, outcomes: impl IntoIterator<Item = Outcome>) {
        self.scripts
            .lock()
            .await
            .entry(provider_id.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// Outcome used for `provider_id` once its script runs out.
    pub async fn always(&self, provider_id: &str, outcome: Outcome) {
        self.fallback
            .lock()
            .await
            .insert(provider_id.to_string(), outcome);
    }

    /// `(provider_id, reminder_id)` for every send, in call order.
    pub async fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().await.clone()
    }

    /// Number of sends that reached `reminder_id` through any provider.
    pub async fn sends_for(&self, reminder_id: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|(_, r)| r == reminder_id)
            .count()
    }

    async fn next_outcome(&self, provider_id: &str) -> Outcome {
        if let Some(outcome) = self
            .scripts
            .lock()
            .await
            .get_mut(provider_id)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }
        self.fallback
            .lock()
            .await
            .get(provider_id)
            .cloned()
            .unwrap_or(Outcome::Deliver)
    }
}

#[async_trait]
impl DeliveryTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(
        &self,
        provider: &ProviderConfig,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, CourierError> {
        self.calls
            .lock()
            .await
            .push((provider.id.clone(), email.reminder_id.clone()));

        match self.next_outcome(&provider.id).await {
            Outcome::Deliver => {}
            Outcome::Fail(message) => {
                return Err(CourierError::Delivery {
                    provider: provider.id.clone(),
                    message,
                });
            }
            Outcome::Hang(delay) => tokio::time::sleep(delay).await,
        }

        Ok(DeliveryReceipt {
            provider_id: provider.id.clone(),
            detail: "OK".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{due_reminder, provider};

    #[tokio::test]
    async fn script_then_fallback() {
        let transport = MockTransport::new();
        let p = provider("p1", 1, 10);
        let email = OutboundEmail::from(&due_reminder("r1"));

        transport.script("p1", [Outcome::Fail("boom".into())]).await;
        assert!(transport.send(&p, &email).await.is_err());
        assert!(transport.send(&p, &email).await.is_ok());

        transport.always("p1", Outcome::Fail("down".into())).await;
        let err = transport.send(&p, &email).await.unwrap_err();
        assert!(err.to_string().contains("down"));
        assert_eq!(transport.sends_for("r1").await, 3);
    }
}
