// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request guards for the gateway.
//!
//! - The cron route requires an `x-cron-secret` header equal to the
//!   configured `cron.secret`, compared in constant time.
//! - Development routes answer 403 when the service runs in production.
//!
//! Both guards run before any handler, so a rejected request never reaches
//! the store.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use courier_config::Environment;
use courier_core::CourierError;

use crate::handlers::ErrorResponse;

/// Header carrying the shared trigger secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

type HmacSha256 = Hmac<Sha256>;

/// Guard configuration shared by every route.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected `x-cron-secret`. `None` rejects every trigger request.
    pub cron_secret: Option<String>,
    pub environment: Environment,
    /// Signer for development tokens. `None` when no signing secret is set.
    pub dev_tokens: Option<DevTokenSigner>,
    /// Identity embedded in every development token.
    pub dev_identity: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("cron_secret", &self.cron_secret.as_ref().map(|_| "[redacted]"))
            .field("environment", &self.environment)
            .field("dev_tokens", &self.dev_tokens.is_some())
            .field("dev_identity", &self.dev_identity)
            .finish()
    }
}

impl AuthConfig {
    /// Whether `presented` matches the configured cron secret.
    ///
    /// Unset or blank secrets never match.
    pub fn cron_secret_matches(&self, presented: Option<&str>) -> bool {
        let (Some(expected), Some(presented)) = (self.cron_secret.as_deref(), presented) else {
            return false;
        };
        if expected.trim().is_empty() {
            return false;
        }
        bool::from(expected.as_bytes().ct_eq(presented.as_bytes()))
    }
}

fn forbidden(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse {
            error: message.to_string(),
            details: None,
        }),
    )
        .into_response()
}

fn presented_secret(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Rejects trigger requests whose `x-cron-secret` does not match.
pub async fn cron_secret_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    if auth.cron_secret.is_none() {
        tracing::error!("cron.secret is not configured -- rejecting trigger request");
        return forbidden("forbidden");
    }
    if !auth.cron_secret_matches(presented_secret(request.headers())) {
        tracing::warn!("trigger request rejected: bad or missing x-cron-secret");
        return forbidden("forbidden");
    }
    next.run(request).await
}

/// Rejects requests to development routes when running in production.
pub async fn dev_only_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    if auth.environment.is_production() {
        tracing::warn!(path = %request.uri().path(), "development route called in production");
        return forbidden("development routes are disabled in production");
    }
    next.run(request).await
}

/// Issues and verifies short-lived HMAC-SHA256 development tokens.
///
/// Token layout: `hex(identity) "." expiry_unix_secs "." hex(mac)` where the
/// MAC covers `identity "." expiry`.
#[derive(Clone)]
pub struct DevTokenSigner {
    key: Vec<u8>,
    ttl: chrono::Duration,
}

impl DevTokenSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, CourierError> {
        if secret.trim().is_empty() {
            return Err(CourierError::Config(
                "gateway.dev_token_secret must not be blank".into(),
            ));
        }
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                CourierError::Config(format!("gateway.dev_token_ttl_secs {ttl_secs} is out of range"))
            })?;
        Ok(Self {
            key: secret.as_bytes().to_vec(),
            ttl,
        })
    }

    fn mac(&self) -> Result<HmacSha256, CourierError> {
        HmacSha256::new_from_slice(&self.key)
            .map_err(|e| CourierError::Internal(format!("invalid HMAC key: {e}")))
    }

    fn signature(&self, identity: &str, expires: i64) -> Result<Vec<u8>, CourierError> {
        let mut mac = self.mac()?;
        mac.update(identity.as_bytes());
        mac.update(b".");
        mac.update(expires.to_string().as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Sign a token for `identity` valid until `now + ttl`.
    pub fn issue(&self, identity: &str, now: DateTime<Utc>) -> Result<String, CourierError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .timestamp();
        let sig = self.signature(identity, expires)?;
        Ok(format!(
            "{}.{}.{}",
            hex::encode(identity),
            expires,
            hex::encode(sig)
        ))
    }

    /// Check a token's signature and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<String, CourierError> {
        let mut parts = token.splitn(3, '.');
        let (Some(identity_hex), Some(expires), Some(sig_hex)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(CourierError::Unauthorized);
        };

        let identity = hex::decode(identity_hex)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or(CourierError::Unauthorized)?;
        let expires: i64 = expires.parse().map_err(|_| CourierError::Unauthorized)?;
        let sig = hex::decode(sig_hex).map_err(|_| CourierError::Unauthorized)?;

        let mut mac = self.mac()?;
        mac.update(identity.as_bytes());
        mac.update(b".");
        mac.update(expires.to_string().as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| CourierError::Unauthorized)?;

        if now.timestamp() >= expires {
            return Err(CourierError::Unauthorized);
        }
        Ok(identity)
    }
}
