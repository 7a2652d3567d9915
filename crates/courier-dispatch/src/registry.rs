// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable, priority-ordered set of delivery providers.

use serde::Serialize;

use courier_core::ProviderConfig;

/// Configured providers sorted by `(priority, id)`. Built once at startup
/// and shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderConfig>,
}

/// A provider as shown to operators, with credentials masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub id: String,
    pub name: String,
    pub service_id: String,
    pub template_id: String,
    pub priority: i32,
    pub daily_quota: u32,
    pub is_default: bool,
    pub endpoint: String,
    pub public_key: String,
    pub private_key: String,
}

impl ProviderRegistry {
    pub fn from_configs(mut providers: Vec<ProviderConfig>) -> Self {
        providers.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        Self { providers }
    }

    /// Providers in try order. An empty slice means nothing is eligible.
    pub fn list_providers(&self) -> &[ProviderConfig] {
        &self.providers
    }

    /// The first provider marked `is_default`, in try order.
    pub fn default_provider(&self) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.is_default)
    }

    pub fn get(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn summaries(&self) -> Vec<ProviderSummary> {
        self.providers
            .iter()
            .map(|p| ProviderSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                service_id: p.service_id.clone(),
                template_id: p.template_id.clone(),
                priority: p.priority,
                daily_quota: p.daily_quota,
                is_default: p.is_default,
                endpoint: p.endpoint.clone(),
                public_key: mask_secret(p.public_key.as_deref()),
                private_key: mask_secret(p.private_key.as_deref()),
            })
            .collect()
    }
}

/// `****` followed by at most the last four characters. Short secrets reveal
/// less so that at least half stays hidden.
pub fn mask_secret(secret: Option<&str>) -> String {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let chars: Vec<char> = secret.chars().collect();
    let shown = (chars.len() / 2).min(4);
    let tail: String = chars[chars.len() - shown..].iter().collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_test_utils::fixtures::provider;

    #[test]
    fn sorted_by_priority_then_id() {
        let registry = ProviderRegistry::from_configs(vec![
            provider("zeta", 2, 10),
            provider("beta", 1, 10),
            provider("alpha", 2, 10),
        ]);
        let ids: Vec<_> = registry.list_providers().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["beta", "alpha", "zeta"]);
    }

    #[test]
    fn default_provider_lookup() {
        let mut backup = provider("backup", 2, 10);
        backup.is_default = true;
        let registry = ProviderRegistry::from_configs(vec![provider("main", 1, 10), backup]);
        assert_eq!(registry.default_provider().unwrap().id, "backup");
        assert!(ProviderRegistry::default().default_provider().is_none());
    }

    #[test]
    fn empty_registry_is_valid() {
        let registry = ProviderRegistry::from_configs(Vec::new());
        assert!(registry.is_empty());
        assert!(registry.list_providers().is_empty());
    }

    #[test]
    fn summaries_mask_credentials() {
        let registry = ProviderRegistry::from_configs(vec![provider("main", 1, 10)]);
        let summary = &registry.summaries()[0];
        assert_eq!(summary.private_key, "****vate");
        assert_eq!(summary.public_key, "****blic");
        assert!(!summary.private_key.contains("sk_main"));
    }

    #[test]
    fn mask_short_and_missing_secrets() {
        assert_eq!(mask_secret(None), "");
        assert_eq!(mask_secret(Some("")), "");
        assert_eq!(mask_secret(Some("ab")), "****b");
        assert_eq!(mask_secret(Some("abcdef")), "****def");
    }

    proptest::proptest! {
        #[test]
        fn mask_never_reveals_more_than_half(secret in "\\PC{1,64}") {
            let masked = mask_secret(Some(&secret));
            let shown = masked.strip_prefix("****").unwrap();
            let len = secret.chars().count();
            proptest::prop_assert!(shown.chars().count() <= (len / 2).min(4));
            proptest::prop_assert!(secret.ends_with(shown));
        }
    }
}
