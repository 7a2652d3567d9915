// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers semantic constraints serde attributes cannot express: unique
//! provider ids, probability ranges, non-zero batch limits, and the secrets
//! a production deployment must carry.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing on the first one.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.gateway.host.trim().is_empty() {
        fail("gateway.host must not be empty".to_string());
    }

    if config.gateway.dev_token_ttl_secs == 0 {
        fail("gateway.dev_token_ttl_secs must be at least 1".to_string());
    }

    if config.cron.batch_size == 0 {
        fail("cron.batch_size must be at least 1".to_string());
    }

    if config.cron.concurrency == 0 {
        fail("cron.concurrency must be at least 1".to_string());
    }

    if config.cron.run_timeout_secs == 0 {
        fail("cron.run_timeout_secs must be at least 1".to_string());
    }

    if config.cron.schedule.trim().is_empty() {
        fail("cron.schedule must not be empty".to_string());
    }

    if matches!(&config.cron.secret, Some(s) if s.trim().is_empty()) {
        fail("cron.secret must not be blank when set".to_string());
    }

    if config.app.environment.is_production() && config.cron.secret.is_none() {
        fail("cron.secret is required when app.environment = \"production\"".to_string());
    }

    if config.dispatch.send_timeout_secs == 0 {
        fail("dispatch.send_timeout_secs must be at least 1".to_string());
    }

    // A claim lives until its last provider attempt ends: an item started just
    // before the run deadline may still try every provider in turn.
    let providers = u64::try_from(config.providers.len().max(1)).unwrap_or(u64::MAX);
    let longest_claim = config
        .cron
        .run_timeout_secs
        .saturating_add(config.dispatch.send_timeout_secs.saturating_mul(providers));
    if config.cron.stale_after_secs <= longest_claim {
        fail(format!(
            "cron.stale_after_secs ({}) must exceed cron.run_timeout_secs + \
             providers x dispatch.send_timeout_secs ({longest_claim}), \
             or live claims are reclaimed and sent twice",
            config.cron.stale_after_secs
        ));
    }

    let rate = config.audit.sample_rate;
    if !(0.0..=1.0).contains(&rate) {
        fail(format!("audit.sample_rate must be within 0.0..=1.0, got {rate}"));
    }

    if config.audit.queue_capacity == 0 {
        fail("audit.queue_capacity must be at least 1".to_string());
    }

    if config.audit.user_agent.trim().is_empty() {
        fail("audit.user_agent must not be empty".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, provider) in config.providers.iter().enumerate() {
        if provider.id.trim().is_empty() {
            fail(format!("providers[{i}].id must not be empty"));
        } else if !seen_ids.insert(provider.id.as_str()) {
            fail(format!("duplicate provider id `{}` in [[providers]]", provider.id));
        }
        if provider.service_id.trim().is_empty() {
            fail(format!("providers[{i}].service_id must not be empty"));
        }
        if provider.template_id.trim().is_empty() {
            fail(format!("providers[{i}].template_id must not be empty"));
        }
        if !provider.endpoint.starts_with("http://") && !provider.endpoint.starts_with("https://")
        {
            fail(format!(
                "providers[{i}].endpoint `{}` must be an http(s) URL",
                provider.endpoint
            ));
        }
    }

    if config.providers.iter().filter(|p| p.is_default).count() > 1 {
        fail("at most one provider may set is_default = true".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
