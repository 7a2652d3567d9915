// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EmailJS transport against a mock HTTP server.

use courier_core::{DeliveryTransport, OutboundEmail, ProviderConfig};
use courier_email::EmailJsTransport;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEND_PATH: &str = "/api/v1.0/email/send";

fn provider(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        id: "primary".to_string(),
        name: "Primary".to_string(),
        service_id: "service_a".to_string(),
        template_id: "template_a".to_string(),
        priority: 1,
        daily_quota: 200,
        is_default: true,
        endpoint: format!("{}{SEND_PATH}", server.uri()),
        public_key: Some("pub_key".to_string()),
        private_key: Some("priv_key".to_string()),
    }
}

fn email() -> OutboundEmail {
    OutboundEmail {
        reminder_id: "r1".to_string(),
        to: "ada@example.com".to_string(),
        to_name: None,
        template_params: json!({"event": "Standup"}),
    }
}

#[tokio::test]
async fn posts_emailjs_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(body_partial_json(json!({
            "service_id": "service_a",
            "template_id": "template_a",
            "user_id": "pub_key",
            "accessToken": "priv_key",
            "template_params": {"event": "Standup", "to_email": "ada@example.com"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = EmailJsTransport::new().unwrap();
    let receipt = transport.send(&provider(&server), &email()).await.unwrap();
    assert_eq!(receipt.provider_id, "primary");
    assert_eq!(receipt.detail, "OK");
}

#[tokio::test]
async fn non_success_status_is_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("The template ID is invalid"))
        .mount(&server)
        .await;

    let transport = EmailJsTransport::new().unwrap();
    let err = transport
        .send(&provider(&server), &email())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    let message = err.to_string();
    assert!(message.contains("primary"));
    assert!(message.contains("HTTP 400"));
    assert!(message.contains("template ID is invalid"));
}

#[tokio::test]
async fn unreachable_endpoint_is_delivery_error() {
    let server = MockServer::start().await;
    let mut p = provider(&server);
    p.endpoint = "http://127.0.0.1:9/api/v1.0/email/send".to_string();
    drop(server);

    let transport = EmailJsTransport::new().unwrap();
    let err = transport.send(&p, &email()).await.unwrap_err();
    assert!(err.is_transient());
}
