use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::TimeSource;
use crate::config::AuthConfig;
use crate::key_provider::KeyProviderEntry;

/// Every configured key provider, reachable by provider name or by issuer
///
/// The issuer index is built once: when several providers share an issuer
/// only the first one in configuration order is returned by
/// [`KeyProviderCache::find_by_issuer`]. The others stay reachable through
/// [`KeyProviderCache::find_by_provider`]. A provider with an empty issuer
/// catches tokens whose issuer has no provider of its own.
pub struct KeyProviderCache {
    entries: Vec<KeyProviderEntry>,
    by_provider: HashMap<String, usize>,
    by_issuer: HashMap<String, usize>,
}

impl KeyProviderCache {
    pub fn new(config: &AuthConfig, time_source: Arc<dyn TimeSource>) -> Self {
        let mut entries = Vec::new();
        let mut by_provider = HashMap::new();
        let mut by_issuer = HashMap::new();

        for (name, provider) in config.providers() {
            let index = entries.len();
            by_provider.insert(name.to_string(), index);
            by_issuer.entry(provider.issuer.clone()).or_insert(index);
            entries.push(KeyProviderEntry::new(
                name,
                provider.clone(),
                Arc::clone(&time_source),
            ));
        }

        Self {
            entries,
            by_provider,
            by_issuer,
        }
    }

    /// Entry of a configured provider
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a configured provider. Provider names are
    /// validated against the configuration before requests are served, so an
    /// unknown name is a bug in the caller, not a runtime condition.
    pub fn find_by_provider(&self, name: &str) -> &KeyProviderEntry {
        match self.by_provider.get(name) {
            Some(&index) => &self.entries[index],
            None => panic!("key provider `{name}` is not configured"),
        }
    }

    /// Entry serving `issuer`, falling back to the empty-issuer provider
    pub fn find_by_issuer(&self, issuer: &str) -> Option<&KeyProviderEntry> {
        let index = self.by_issuer.get(issuer).or_else(|| {
            if issuer.is_empty() {
                None
            } else {
                self.by_issuer.get("")
            }
        })?;
        Some(&self.entries[*index])
    }

    pub fn contains_provider(&self, name: &str) -> bool {
        self.by_provider.contains_key(name)
    }

    /// Entries in configuration order
    pub fn providers(&self) -> impl Iterator<Item = &KeyProviderEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
