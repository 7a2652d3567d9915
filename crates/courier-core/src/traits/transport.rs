// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery transport trait for email-sending backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CourierError;
use crate::types::{ProviderConfig, ReminderWorkItem};

/// The message handed to a transport. Rendering happens provider-side from
/// `template_params`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub reminder_id: String,
    pub to: String,
    pub to_name: Option<String>,
    pub template_params: Value,
}

impl From<&ReminderWorkItem> for OutboundEmail {
    fn from(item: &ReminderWorkItem) -> Self {
        Self {
            reminder_id: item.id.clone(),
            to: item.recipient.clone(),
            to_name: item.recipient_name.clone(),
            template_params: item.template_params.clone(),
        }
    }
}

/// What a provider answered on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub provider_id: String,
    pub detail: String,
}

/// An email-delivery backend.
///
/// One transport may serve several configured providers; the provider
/// configuration carries the per-channel identity and credentials.
#[async_trait]
pub trait DeliveryTransport: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Attempt one send through `provider`.
    ///
    /// Any error is treated as a failure of this provider only.
    async fn send(
        &self,
        provider: &ProviderConfig,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, CourierError>;
}
