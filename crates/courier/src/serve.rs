// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` and the service graph shared by every command.
//!
//! Storage, the audit writer, the delivery transport, the dispatch engine and
//! the trigger are wired once here. `serve` puts the HTTP gateway in front of
//! them and optionally starts the in-process cron runner.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use courier_audit::{AuditHandle, AuditSink};
use courier_config::CourierConfig;
use courier_core::CourierError;
use courier_cron::{CronRunner, ReminderTrigger};
use courier_dispatch::{DispatchEngine, ProviderRegistry};
use courier_email::EmailJsTransport;
use courier_gateway::{GatewayState, ServerConfig};
use courier_storage::SqliteStorage;

use crate::shutdown;

const AUDIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a trigger run needs, wired from configuration.
pub struct Services {
    pub storage: Arc<SqliteStorage>,
    pub registry: Arc<ProviderRegistry>,
    pub engine: Arc<DispatchEngine>,
    pub trigger: Arc<ReminderTrigger>,
    audit_writer: JoinHandle<()>,
}

impl Services {
    pub async fn build(config: &CourierConfig) -> Result<Self, CourierError> {
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let sink = Arc::new(AuditSink::new(storage.clone(), &config.audit));
        let (audit, audit_writer) = AuditHandle::spawn(sink, config.audit.queue_capacity);

        let registry = Arc::new(ProviderRegistry::from_configs(config.providers.clone()));
        if registry.is_empty() {
            warn!("no providers configured -- every due reminder will fail");
        }

        let transport = Arc::new(EmailJsTransport::new()?);
        let engine = Arc::new(
            DispatchEngine::new(
                registry.clone(),
                storage.clone(),
                storage.clone(),
                audit,
                &config.dispatch,
            )
            .with_default_transport(transport),
        );
        let trigger = Arc::new(ReminderTrigger::new(
            storage.clone(),
            engine.clone(),
            &config.cron,
        ));

        info!(providers = registry.len(), "services initialized");
        Ok(Self {
            storage,
            registry,
            engine,
            trigger,
            audit_writer,
        })
    }

    /// Drain the audit queue and checkpoint storage.
    pub async fn shutdown(self) -> Result<(), CourierError> {
        self.engine.audit().flush().await;
        let Self {
            storage,
            engine,
            trigger,
            audit_writer,
            ..
        } = self;
        // The writer exits once the last handle clone is gone.
        drop(trigger);
        drop(engine);
        match tokio::time::timeout(AUDIT_DRAIN_TIMEOUT, audit_writer).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "audit writer ended abnormally"),
            Err(_) => warn!("audit writer still running at shutdown"),
        }
        storage.close().await
    }
}

/// Install the global Prometheus recorder and describe every metric.
pub fn install_metrics() -> Result<PrometheusHandle, CourierError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CourierError::Internal(format!("failed to install Prometheus recorder: {e}")))?;

    courier_dispatch::recording::register_metrics();
    courier_audit::recording::register_metrics();

    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Run the gateway (and the cron runner when enabled) until a shutdown signal.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    let metrics = install_metrics()?;
    let cancel = shutdown::install_signal_handler();
    let services = Services::build(&config).await?;

    let runner = if config.cron.enabled {
        let runner = CronRunner::new(
            services.trigger.clone(),
            &config.cron.schedule,
            cancel.child_token(),
        )?;
        Some(runner.spawn())
    } else {
        info!("in-process cron runner disabled; waiting for HTTP triggers");
        None
    };

    let state = GatewayState::from_config(
        &config,
        services.trigger.clone(),
        services.registry.clone(),
    )?
    .with_metrics(Arc::new(move || metrics.render()));

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let served = courier_gateway::start_server(&server_config, state, cancel.clone()).await;

    // A bind failure returns before any signal; stop the runner either way.
    cancel.cancel();
    if let Some(runner) = runner
        && let Err(e) = runner.await
    {
        warn!(error = %e, "cron runner ended abnormally");
    }

    services.shutdown().await?;
    info!("courier stopped");
    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courier_core::{ReminderState, ReminderStore, RunSummary};
    use courier_test_utils::fixtures::due_reminder;

    fn config_in(dir: &tempfile::TempDir) -> CourierConfig {
        let mut config = CourierConfig::default();
        config.storage.database_path = dir
            .path()
            .join("courier.db")
            .to_string_lossy()
            .into_owned();
        config
    }

    #[tokio::test]
    async fn services_run_against_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let services = Services::build(&config).await.unwrap();
        services
            .storage
            .insert_reminder(&due_reminder("r1"))
            .await
            .unwrap();

        // No providers configured: the item is marked failed, not left in flight.
        let summary = services.trigger.process_due(Utc::now()).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                processed: 1,
                succeeded: 0,
                failed: 1
            }
        );
        let item = services.storage.get_reminder("r1").await.unwrap().unwrap();
        assert_eq!(item.state, ReminderState::Failed);

        services.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_persists_exhaustion_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);
        let services = Services::build(&config).await.unwrap();
        services
            .storage
            .insert_reminder(&due_reminder("r1"))
            .await
            .unwrap();
        services.trigger.process_due(Utc::now()).await.unwrap();
        let storage = services.storage.clone();
        services.shutdown().await.unwrap();

        let entries = storage
            .audit_entries(courier_core::AuditStream::Mail)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].record.action, "send_exhausted");
    }
}
