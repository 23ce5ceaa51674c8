use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::RwLock;

use jsonwebtoken::jwk::JwkSet;
use tracing::debug;
use tracing::warn;

use crate::audience::AudienceMatcher;
use crate::clock::TimeSource;
use crate::config::KeyProviderConfig;
use crate::config::LocalJwks;
use crate::error::local_key_set_error;
use crate::error::Result;
use crate::key_set::parse_key_set;
use crate::key_set::Deadline;
use crate::key_set::KeySetRecord;
use crate::token_cache::TokenVerificationCache;

/// Key set state and verified-token cache of one configured key provider
pub struct KeyProviderEntry {
    name: String,
    config: KeyProviderConfig,
    audiences: AudienceMatcher,
    record: RwLock<Option<KeySetRecord>>,
    token_cache: OnceLock<Mutex<TokenVerificationCache>>,
    refresh_lock: tokio::sync::Mutex<()>,
    time_source: Arc<dyn TimeSource>,
}

impl KeyProviderEntry {
    /// Create the entry and load any locally configured key set
    ///
    /// A local key set never expires. If it cannot be read or parsed the
    /// entry starts without a key set, exactly as if none had been configured.
    pub fn new(
        name: impl Into<String>,
        config: KeyProviderConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let name = name.into();
        let audiences = AudienceMatcher::new(&config.audiences);

        let record = match config.local_jwks.as_ref().map(load_local_key_set) {
            Some(Ok(Some(key_set))) => {
                debug!(provider = %name, issuer = %config.issuer, "Loaded local key set");
                Some(KeySetRecord::new(key_set, Deadline::Never))
            }
            Some(Err(error)) => {
                warn!(
                    provider = %name,
                    issuer = %config.issuer,
                    %error,
                    "Invalid local key set"
                );
                None
            }
            Some(Ok(None)) | None => None,
        };

        Self {
            name,
            config,
            audiences,
            record: RwLock::new(record),
            token_cache: OnceLock::new(),
            refresh_lock: tokio::sync::Mutex::new(()),
            time_source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    pub fn config(&self) -> &KeyProviderConfig {
        &self.config
    }

    /// The installed key set, if one was ever loaded successfully
    pub fn key_set(&self) -> Option<Arc<JwkSet>> {
        self.read_record()
            .as_ref()
            .map(|record| Arc::clone(record.key_set()))
    }

    /// The installed key set together with its deadline
    pub fn key_set_record(&self) -> Option<KeySetRecord> {
        self.read_record().clone()
    }

    /// True if no key set is loaded or its deadline has been reached
    pub fn is_expired(&self) -> bool {
        let now = self.time_source.monotonic_now();
        match self.read_record().as_ref() {
            Some(record) => record.is_expired(now),
            None => true,
        }
    }

    /// Install a freshly fetched key set, replacing the current one
    ///
    /// The key set expires after the provider's configured cache duration, or
    /// 600 seconds when none is configured.
    pub fn set_remote_key_set(&self, key_set: JwkSet) -> Arc<JwkSet> {
        let deadline = self
            .time_source
            .monotonic_now()
            .checked_add(self.config.key_set_cache_duration())
            .map_or(Deadline::Never, Deadline::At);
        let record = KeySetRecord::new(key_set, deadline);
        let key_set = Arc::clone(record.key_set());

        *self.record.write().unwrap_or_else(PoisonError::into_inner) = Some(record);
        debug!(provider = %self.name, issuer = %self.config.issuer, "Installed remote key set");

        key_set
    }

    pub fn matches_audiences(&self, audiences: &[String]) -> bool {
        self.audiences.are_audiences_allowed(audiences)
    }

    /// The provider's verified-token cache, created on first use
    pub fn token_cache(&self) -> MutexGuard<'_, TokenVerificationCache> {
        self.token_cache
            .get_or_init(|| {
                Mutex::new(TokenVerificationCache::from_settings(
                    self.config.token_cache_enabled,
                    self.config.effective_token_cache_size(),
                    Arc::clone(&self.time_source),
                ))
            })
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Serializes remote fetches so concurrent requests trigger one refresh
    pub fn refresh_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.refresh_lock
    }

    fn read_record(&self) -> std::sync::RwLockReadGuard<'_, Option<KeySetRecord>> {
        self.record.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_local_key_set(local: &LocalJwks) -> Result<Option<JwkSet>> {
    let jwks = match local {
        LocalJwks::Inline(jwks) => jwks.clone(),
        LocalJwks::File(path) => {
            std::fs::read_to_string(path).map_err(|error| local_key_set_error(path, error))?
        }
    };

    if jwks.trim().is_empty() {
        return Ok(None);
    }

    parse_key_set(&jwks).map(Some)
}
