// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for common test values.

use chrono::{Duration, Utc};
use serde_json::json;

use courier_core::types::DEFAULT_PROVIDER_ENDPOINT;
use courier_core::{ProviderConfig, ReminderWorkItem};

/// A provider with the given priority and daily quota.
pub fn provider(id: &str, priority: i32, daily_quota: u32) -> ProviderConfig {
    ProviderConfig {
        id: id.to_string(),
        name: format!("Provider {id}"),
        service_id: format!("service_{id}"),
        template_id: format!("template_{id}"),
        priority,
        daily_quota,
        is_default: false,
        endpoint: DEFAULT_PROVIDER_ENDPOINT.to_string(),
        public_key: Some(format!("pk_{id}_public")),
        private_key: Some(format!("sk_{id}_private")),
    }
}

/// A pending reminder that became due one minute ago.
pub fn due_reminder(id: &str) -> ReminderWorkItem {
    due_reminder_at(id, Duration::minutes(-1))
}

/// A pending reminder due at `now + offset`.
pub fn due_reminder_at(id: &str, offset: Duration) -> ReminderWorkItem {
    ReminderWorkItem::pending(
        id,
        format!("{id}@example.com"),
        json!({"subject": "Reminder", "reminder_id": id}),
        Utc::now() + offset,
    )
}
