// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit metric names and descriptions.

use metrics::describe_counter;

pub const AUDIT_DROPPED_TOTAL: &str = "courier_audit_dropped_total";
pub const AUDIT_SAMPLED_TOTAL: &str = "courier_audit_sampled_total";

/// Register audit metric descriptions. Call once after installing a recorder.
pub fn register_metrics() {
    describe_counter!(
        AUDIT_DROPPED_TOTAL,
        "Audit records dropped because the writer queue was full"
    );
    describe_counter!(
        AUDIT_SAMPLED_TOTAL,
        "Sample-eligible audit records skipped by sampling"
    );
}
