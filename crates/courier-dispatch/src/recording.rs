// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch metric registration and recording helpers.

use metrics::describe_counter;

/// Register dispatch metric descriptions. Call once after installing a recorder.
pub fn register_metrics() {
    describe_counter!(
        "courier_dispatch_sent_total",
        "Reminders delivered, by provider"
    );
    describe_counter!(
        "courier_dispatch_failed_total",
        "Reminders that exhausted every eligible provider"
    );
}

pub fn record_sent(provider_id: &str) {
    metrics::counter!("courier_dispatch_sent_total", "provider" => provider_id.to_string())
        .increment(1);
}

pub fn record_exhausted() {
    metrics::counter!("courier_dispatch_failed_total").increment(1);
}
