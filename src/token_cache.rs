use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::claims::VerifiedToken;
use crate::clock::TimeSource;
use crate::config::DEFAULT_TOKEN_CACHE_SIZE;

/// Bounded cache of verified tokens keyed by the raw token string
///
/// Entries are evicted least-recently-used first once the capacity is reached.
/// Expired tokens are not swept in the background; a lookup that finds one
/// removes it and reports a miss, so an expired verification is never served.
///
/// A disabled cache keeps nothing: lookups always miss and inserts drop the
/// token.
pub struct TokenVerificationCache {
    entries: Option<LruCache<String, VerifiedToken>>,
    time_source: Arc<dyn TimeSource>,
}

impl TokenVerificationCache {
    pub fn new(capacity: NonZeroUsize, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: Some(LruCache::new(capacity)),
            time_source,
        }
    }

    pub fn disabled(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            entries: None,
            time_source,
        }
    }

    /// Build a cache from configuration values, where a size of 0 means the
    /// default of 100 entries
    pub fn from_settings(enabled: bool, size: usize, time_source: Arc<dyn TimeSource>) -> Self {
        if !enabled {
            return Self::disabled(time_source);
        }

        let capacity = NonZeroUsize::new(size).unwrap_or(DEFAULT_CAPACITY);
        Self::new(capacity, time_source)
    }

    /// Look up a previously verified token
    ///
    /// The entry becomes the most recently used one. If the token has expired
    /// since it was cached it is removed and `None` is returned.
    pub fn lookup(&mut self, token: &str) -> Option<&VerifiedToken> {
        let entries = self.entries.as_mut()?;
        let now = self.time_source.now_seconds();

        if entries.get(token)?.is_expired(now) {
            entries.pop(token);
            debug!("Removed expired token from the verification cache");
            return None;
        }

        entries.peek(token)
    }

    /// Store a verified token, taking ownership of it
    ///
    /// An existing entry for the same token is replaced. When the cache is
    /// full the least recently used entry is evicted.
    pub fn insert(&mut self, token: impl Into<String>, verified: VerifiedToken) {
        if let Some(entries) = self.entries.as_mut() {
            entries.put(token.into(), verified);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    /// Maximum number of entries; 0 for a disabled cache
    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |entries| entries.cap().get())
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check for an entry without touching its recency or expiration
    pub fn contains(&self, token: &str) -> bool {
        self.entries
            .as_ref()
            .is_some_and(|entries| entries.contains(token))
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }
}

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(DEFAULT_TOKEN_CACHE_SIZE) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};
