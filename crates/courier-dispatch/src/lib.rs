// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider registry and the failover dispatch engine.

pub mod engine;
pub mod recording;
pub mod registry;

pub use engine::{DispatchEngine, NO_ELIGIBLE_PROVIDER};
pub use registry::{ProviderRegistry, ProviderSummary, mask_secret};
