// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit trail with probabilistic sampling.
//!
//! [`AuditSink`] stamps and persists records, dropping a configurable share of
//! those flagged `shouldSample`. Store failures are logged and reported as
//! [`AuditReceipt::Failed`], never raised. [`AuditHandle`] puts an ordered,
//! bounded writer queue in front of the sink for fire-and-forget use.

pub mod handle;
pub mod recording;
pub mod sampler;
pub mod sink;

pub use handle::AuditHandle;
pub use sampler::Sampler;
pub use sink::{AuditReceipt, AuditSink};
