// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use courier_config::CourierConfig;
use courier_core::CourierError;
use courier_cron::ReminderTrigger;
use courier_dispatch::ProviderRegistry;

use crate::auth::{AuthConfig, DevTokenSigner, cron_secret_middleware, dev_only_middleware};
use crate::handlers;

/// State for the unauthenticated health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: std::time::Instant,
    /// Renders Prometheus text when a recorder is installed.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub trigger: Arc<ReminderTrigger>,
    pub registry: Arc<ProviderRegistry>,
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    /// Build handler state from loaded configuration.
    pub fn from_config(
        config: &CourierConfig,
        trigger: Arc<ReminderTrigger>,
        registry: Arc<ProviderRegistry>,
    ) -> Result<Self, CourierError> {
        let dev_tokens = config
            .gateway
            .dev_token_secret
            .as_deref()
            .map(|secret| DevTokenSigner::new(secret, config.gateway.dev_token_ttl_secs))
            .transpose()?;

        Ok(Self {
            trigger,
            registry,
            auth: AuthConfig {
                cron_secret: config.cron.secret.clone(),
                environment: config.app.environment,
                dev_tokens,
                dev_identity: config.gateway.dev_identity.clone(),
            },
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render: None,
            },
        })
    }

    pub fn with_metrics(mut self, render: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.health.prometheus_render = Some(render);
        self
    }
}

/// Gateway bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Assemble every route with its guard.
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .route("/api/providers", get(handlers::list_providers))
        .with_state(state.clone());

    let cron_routes = Router::new()
        .route("/api/cron/process-reminders", get(handlers::process_reminders))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state.clone(),
            cron_secret_middleware,
        ))
        .with_state(state.clone());

    let dev_routes = Router::new()
        .route("/api/dev/process-reminders", post(handlers::dev_process_reminders))
        .route("/api/dev/auth", post(handlers::dev_auth))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            dev_only_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(cron_routes)
        .merge(dev_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), CourierError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| CourierError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
