// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Courier crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Default REST endpoint for EmailJS-compatible delivery providers.
pub const DEFAULT_PROVIDER_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Metadata key that opts an audit record into probabilistic sampling.
pub const SHOULD_SAMPLE_KEY: &str = "shouldSample";

/// One configured email-delivery channel.
///
/// Constructed once at startup from configuration and never mutated.
/// `public_key` and `private_key` are credentials and must never be exposed
/// outside the process unmasked.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Stable identifier, unique across providers.
    pub id: String,

    /// Human readable name.
    pub name: String,

    /// Provider-side service identifier.
    pub service_id: String,

    /// Provider-side template identifier.
    pub template_id: String,

    /// Lower values are tried first.
    #[serde(default)]
    pub priority: i32,

    /// Maximum successful sends per UTC day.
    #[serde(default)]
    pub daily_quota: u32,

    /// Marks the provider used when a caller does not choose one.
    #[serde(default)]
    pub is_default: bool,

    /// REST endpoint the transport posts to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Public API key (EmailJS `user_id`).
    #[serde(default)]
    pub public_key: Option<String>,

    /// Private access token.
    #[serde(default)]
    pub private_key: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_PROVIDER_ENDPOINT.to_string()
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("priority", &self.priority)
            .field("daily_quota", &self.daily_quota)
            .field("is_default", &self.is_default)
            .field("endpoint", &self.endpoint)
            .field("public_key", &self.public_key.as_ref().map(|_| "[redacted]"))
            .field("private_key", &self.private_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Lifecycle state of a reminder work item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
    Pending,
    InFlight,
    Sent,
    Failed,
}

impl ReminderState {
    /// Terminal states are retained for audit and never leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

/// One unit of email work due for processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderWorkItem {
    pub id: String,
    /// Recipient email address.
    pub recipient: String,
    pub recipient_name: Option<String>,
    /// Parameters handed verbatim to the provider template.
    pub template_params: Value,
    pub due_at: DateTime<Utc>,
    pub state: ReminderState,
    /// Incremented once per provider try.
    pub attempt_count: u32,
    /// Set when the item moves to `InFlight`; drives stale-claim recovery.
    pub claimed_at: Option<DateTime<Utc>>,
    pub last_provider: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderWorkItem {
    /// Create a new pending reminder due at `due_at`.
    pub fn pending(
        id: impl Into<String>,
        recipient: impl Into<String>,
        template_params: Value,
        due_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            recipient: recipient.into(),
            recipient_name: None,
            template_params,
            due_at,
            state: ReminderState::Pending,
            attempt_count: 0,
            claimed_at: None,
            last_provider: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the item is pending and due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == ReminderState::Pending && self.due_at <= now
    }
}

/// The two append-only audit streams.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditStream {
    /// Generic invite/action events.
    Action,
    /// Mail-send audit entries.
    Mail,
}

impl AuditStream {
    /// Name of the backing collection.
    pub fn collection(self) -> &'static str {
        match self {
            Self::Action => "invite_logs",
            Self::Mail => "mail_logs",
        }
    }
}

/// One logged action or delivery attempt, before the sink stamps it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub action: String,
    pub performed_by: Option<String>,
    pub provider: Option<String>,
    pub duration_ms: Option<u64>,
    pub error_message: Option<String>,
    pub metadata: Map<String, Value>,
}

impl AuditRecord {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn performed_by(mut self, who: impl Into<String>) -> Self {
        self.performed_by = Some(who.into());
        self
    }

    pub fn provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider = Some(provider_id.into());
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Opt in to (or explicitly out of) sampling.
    pub fn sampled(self, should_sample: bool) -> Self {
        self.meta(SHOULD_SAMPLE_KEY, should_sample)
    }

    /// True only when metadata carries `shouldSample: true`.
    pub fn should_sample(&self) -> bool {
        self.metadata
            .get(SHOULD_SAMPLE_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// An audit record as persisted: stamped by the sink at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedAuditRecord {
    pub stream: AuditStream,
    #[serde(flatten)]
    pub record: AuditRecord,
    pub server_timestamp: DateTime<Utc>,
    pub user_agent: String,
}

/// Outcome of dispatching one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchResult {
    Sent { provider_id: String },
    Failed { last_error: String },
    /// The item was not claimable (already claimed or terminal).
    Skipped,
}

/// Counts reported by one trigger run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl RunSummary {
    /// Fold one dispatch result into the counts.
    pub fn record(&mut self, result: &DispatchResult) {
        match result {
            DispatchResult::Sent { .. } => {
                self.processed += 1;
                self.succeeded += 1;
            }
            DispatchResult::Failed { .. } => {
                self.processed += 1;
                self.failed += 1;
            }
            DispatchResult::Skipped => {}
        }
    }
}
