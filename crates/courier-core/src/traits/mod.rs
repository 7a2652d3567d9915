// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the pipeline and its external collaborators.
//!
//! All traits use `#[async_trait]` so they can sit behind `Arc<dyn _>`.

pub mod store;
pub mod transport;

pub use store::{AuditStore, QuotaLedger, ReminderStore};
pub use transport::{DeliveryReceipt, DeliveryTransport, OutboundEmail};
