// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

use courier_core::RunSummary;
use courier_dispatch::ProviderSummary;

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response body for POST /api/dev/auth.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Response body for GET /api/providers.
#[derive(Debug, Serialize)]
pub struct ProviderListResponse {
    pub providers: Vec<ProviderSummary>,
}

async fn run_trigger(state: &GatewayState) -> Response {
    match state.trigger.process_due(Utc::now()).await {
        Ok(summary) => (StatusCode::OK, Json::<RunSummary>(summary)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "reminder processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "reminder processing failed".into(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/cron/process-reminders
///
/// Reached only after the secret guard has accepted the request.
pub async fn process_reminders(State(state): State<GatewayState>) -> Response {
    run_trigger(&state).await
}

/// POST /api/dev/process-reminders
///
/// Same run as the cron route, authorised with the configured secret on the
/// caller's behalf.
pub async fn dev_process_reminders(State(state): State<GatewayState>) -> Response {
    let secret = state.auth.cron_secret.clone();
    if !state.auth.cron_secret_matches(secret.as_deref()) {
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "cron.secret is not configured".into(),
                details: None,
            }),
        )
            .into_response();
    }
    run_trigger(&state).await
}

/// POST /api/dev/auth
pub async fn dev_auth(State(state): State<GatewayState>) -> Response {
    let Some(signer) = state.auth.dev_tokens.as_ref() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "gateway.dev_token_secret is not configured".into(),
                details: None,
            }),
        )
            .into_response();
    };

    match signer.issue(&state.auth.dev_identity, Utc::now()) {
        Ok(token) => {
            tracing::debug!(identity = %state.auth.dev_identity, "issued development token");
            (StatusCode::OK, Json(TokenResponse { token })).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "token signing failed".into(),
                details: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

/// GET /api/providers
pub async fn list_providers(State(state): State<GatewayState>) -> Json<ProviderListResponse> {
    Json(ProviderListResponse {
        providers: state.registry.summaries(),
    })
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text exposition, or 503 when no recorder is installed.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics not enabled").into_response(),
    }
}
