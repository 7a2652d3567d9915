// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier reminder pipeline.

use thiserror::Error;

/// The primary error type used across Courier traits and core operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (missing secret, invalid provider entry, bad TOML).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A delivery provider rejected or failed a send.
    #[error("delivery via `{provider}` failed: {message}")]
    Delivery { provider: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Caller presented missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Operation is not permitted in the current environment.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Wrap any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Whether this error is a provider-level failure that failover can absorb.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Delivery { .. } | Self::Timeout { .. })
    }
}
