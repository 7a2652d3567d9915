// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the EmailJS `email/send` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use courier_core::{
    CourierError, DeliveryReceipt, DeliveryTransport, OutboundEmail, ProviderConfig,
};

/// Upper bound enforced by the HTTP client itself; the dispatch engine
/// applies its own, usually shorter, per-attempt timeout.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request body accepted by EmailJS.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: Value,
}

#[derive(Debug, Clone)]
pub struct EmailJsTransport {
    client: reqwest::Client,
}

impl EmailJsTransport {
    pub fn new() -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CourierError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

/// Template parameters plus the recipient fields every template receives.
fn template_params(email: &OutboundEmail) -> Value {
    let mut params = match &email.template_params {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("params".to_string(), other.clone());
            map
        }
    };
    params
        .entry("to_email")
        .or_insert_with(|| Value::from(email.to.clone()));
    if let Some(name) = &email.to_name {
        params
            .entry("to_name")
            .or_insert_with(|| Value::from(name.clone()));
    }
    Value::Object(params)
}

#[async_trait]
impl DeliveryTransport for EmailJsTransport {
    fn name(&self) -> &str {
        "emailjs"
    }

    async fn send(
        &self,
        provider: &ProviderConfig,
        email: &OutboundEmail,
    ) -> Result<DeliveryReceipt, CourierError> {
        let fail = |message: String| CourierError::Delivery {
            provider: provider.id.clone(),
            message,
        };

        let body = SendRequest {
            service_id: &provider.service_id,
            template_id: &provider.template_id,
            user_id: provider.public_key.as_deref(),
            access_token: provider.private_key.as_deref(),
            template_params: template_params(email),
        };

        let response = self
            .client
            .post(&provider.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| fail(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        debug!(provider = %provider.id, reminder = %email.reminder_id, %status, "emailjs response");

        if status.is_success() {
            Ok(DeliveryReceipt {
                provider_id: provider.id.clone(),
                detail: text,
            })
        } else {
            Err(fail(format!("HTTP {}: {}", status.as_u16(), text.trim())))
        }
    }
}
