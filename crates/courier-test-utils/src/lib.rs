// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides in-memory stores, a scripted delivery transport, and fixture
//! builders for fast, deterministic tests without SQLite or HTTP.
//!
//! # Components
//!
//! - [`MemoryStore`] - reminder, quota, and audit store in one process-local value
//! - [`MockTransport`] - delivery transport with per-provider scripted outcomes
//! - [`fixtures`] - provider and reminder builders

pub mod fixtures;
pub mod memory_store;
pub mod mock_transport;

pub use memory_store::MemoryStore;
pub use mock_transport::{MockTransport, Outcome};
