// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface of Courier.
//!
//! Exposes the guarded reminder trigger used by an external scheduler,
//! development helpers that are disabled in production, a redacted provider
//! listing, and unauthenticated health and metrics endpoints.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, CRON_SECRET_HEADER, DevTokenSigner};
pub use server::{GatewayState, HealthState, ServerConfig, router, start_server};
