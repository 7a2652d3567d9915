// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Courier.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use courier_core::ProviderConfig;

/// Top-level Courier configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section defaults to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Process identity and environment.
    #[serde(default)]
    pub app: AppConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Reminder trigger settings.
    #[serde(default)]
    pub cron: CronConfig,

    /// Dispatch engine settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Configured delivery providers (`[[providers]]`).
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Deployment environment. Development-only routes and maintenance commands
/// are refused in `Production`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: Environment::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "courier".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier").join("courier.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("courier.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Fixed identity that the development auth helper issues tokens for.
    #[serde(default = "default_dev_identity")]
    pub dev_identity: String,

    /// HMAC secret used to sign development tokens. `None` disables issuing.
    #[serde(default)]
    pub dev_token_secret: Option<String>,

    /// Lifetime of development tokens in seconds.
    #[serde(default = "default_dev_token_ttl_secs")]
    pub dev_token_ttl_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            dev_identity: default_dev_identity(),
            dev_token_secret: None,
            dev_token_ttl_secs: default_dev_token_ttl_secs(),
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dev_identity", &self.dev_identity)
            .field(
                "dev_token_secret",
                &self.dev_token_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("dev_token_ttl_secs", &self.dev_token_ttl_secs)
            .finish()
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_dev_identity() -> String {
    "dev-user".to_string()
}

fn default_dev_token_ttl_secs() -> u64 {
    900 // 15 minutes
}

/// Reminder trigger configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CronConfig {
    /// Shared secret expected in the `x-cron-secret` header. `None` rejects
    /// every HTTP trigger.
    #[serde(default)]
    pub secret: Option<String>,

    /// Run an in-process periodic trigger in addition to the HTTP endpoint.
    #[serde(default)]
    pub enabled: bool,

    /// Cron expression for the in-process trigger.
    #[serde(default = "default_cron_schedule")]
    pub schedule: String,

    /// Maximum reminders enumerated per run.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum reminders dispatched in parallel within a run.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// No new reminder is started once a run is this old.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Grace period after which an `InFlight` claim is considered abandoned.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: None,
            enabled: false,
            schedule: default_cron_schedule(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            run_timeout_secs: default_run_timeout_secs(),
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl std::fmt::Debug for CronConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .field("enabled", &self.enabled)
            .field("schedule", &self.schedule)
            .field("batch_size", &self.batch_size)
            .field("concurrency", &self.concurrency)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .field("stale_after_secs", &self.stale_after_secs)
            .finish()
    }
}

fn default_cron_schedule() -> String {
    "*/5 * * * *".to_string()
}

fn default_batch_size() -> usize {
    50
}

fn default_concurrency() -> usize {
    4
}

fn default_run_timeout_secs() -> u64 {
    55
}

fn default_stale_after_secs() -> u64 {
    900 // 15 minutes
}

/// Dispatch engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Upper bound for a single provider send attempt.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_send_timeout_secs() -> u64 {
    10
}

/// Audit sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Persistence probability for records flagged `shouldSample` (0.0-1.0).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Writer-origin tag stamped on every record.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Capacity of the fire-and-forget write queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            user_agent: default_user_agent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_sample_rate() -> f64 {
    0.1
}

fn default_user_agent() -> String {
    "server-cron".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}
