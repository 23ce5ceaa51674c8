use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default time a remotely fetched key set stays valid
pub const DEFAULT_KEY_SET_CACHE_DURATION: Duration = Duration::from_secs(600);

/// Default number of verified tokens kept per provider
pub const DEFAULT_TOKEN_CACHE_SIZE: usize = 100;

/// Locally provided key set material, loaded once when the provider is created
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalJwks {
    /// JWKS JSON embedded in the configuration
    Inline(String),
    /// Path to a file containing JWKS JSON
    File(PathBuf),
}

/// Remote key set source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteJwks {
    /// URL of the JWKS document
    pub uri: String,
}

impl RemoteJwks {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

/// Configuration of a single key provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyProviderConfig {
    /// Issuer served by this provider; empty matches tokens of any issuer
    #[serde(default)]
    pub issuer: String,
    /// Allowed audiences; empty allows every audience
    #[serde(default)]
    pub audiences: Vec<String>,
    /// Key set material available without a network fetch
    #[serde(default)]
    pub local_jwks: Option<LocalJwks>,
    /// Where to fetch the key set from when it is missing or expired
    #[serde(default)]
    pub remote_jwks: Option<RemoteJwks>,
    /// How long a fetched key set stays valid; unset or zero uses 600 seconds
    #[serde(default, with = "duration_secs")]
    pub cache_duration: Option<Duration>,
    /// Capacity of the verified-token cache; 0 uses the default of 100
    #[serde(default)]
    pub token_cache_size: usize,
    /// Whether verified tokens are cached at all
    #[serde(default = "enabled")]
    pub token_cache_enabled: bool,
}

impl KeyProviderConfig {
    /// Create a provider for the given issuer with no key source configured
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audiences: Vec::new(),
            local_jwks: None,
            remote_jwks: None,
            cache_duration: None,
            token_cache_size: 0,
            token_cache_enabled: true,
        }
    }

    /// Set the audiences a token must match at least one of
    pub fn with_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audiences = audiences.into_iter().map(Into::into).collect();
        self
    }

    /// Add a single allowed audience
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    /// Embed a JWKS document in the configuration
    pub fn with_inline_jwks(mut self, jwks: impl Into<String>) -> Self {
        self.local_jwks = Some(LocalJwks::Inline(jwks.into()));
        self
    }

    /// Load the JWKS document from a file when the provider is created
    pub fn with_jwks_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_jwks = Some(LocalJwks::File(path.into()));
        self
    }

    /// Fetch the key set from the given URL
    pub fn with_remote_jwks(mut self, uri: impl Into<String>) -> Self {
        self.remote_jwks = Some(RemoteJwks::new(uri));
        self
    }

    /// Set how long a fetched key set stays valid
    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = Some(duration);
        self
    }

    /// Set the capacity of the verified-token cache
    pub fn with_token_cache_size(mut self, size: usize) -> Self {
        self.token_cache_size = size;
        self
    }

    /// Do not cache verified tokens for this provider
    pub fn without_token_cache(mut self) -> Self {
        self.token_cache_enabled = false;
        self
    }

    /// Lifetime of a remotely fetched key set after applying the default
    ///
    /// A zero duration counts as unset, so an installed key set always has a
    /// deadline in the future.
    pub fn key_set_cache_duration(&self) -> Duration {
        self.cache_duration
            .filter(|duration| !duration.is_zero())
            .unwrap_or(DEFAULT_KEY_SET_CACHE_DURATION)
    }

    /// Capacity of the verified-token cache after applying the default
    pub fn effective_token_cache_size(&self) -> usize {
        if self.token_cache_size > 0 {
            self.token_cache_size
        } else {
            DEFAULT_TOKEN_CACHE_SIZE
        }
    }
}

/// Authentication configuration: every key provider, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthConfig {
    #[serde(default, with = "ordered_providers")]
    providers: Vec<(String, KeyProviderConfig)>,
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider under a unique name
    ///
    /// Adding a name twice replaces the earlier configuration but keeps its
    /// position in the provider order.
    pub fn with_provider(mut self, name: impl Into<String>, provider: KeyProviderConfig) -> Self {
        let name = name.into();
        match self.providers.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = provider,
            None => self.providers.push((name, provider)),
        }
        self
    }

    /// Providers in configuration order
    pub fn providers(&self) -> impl Iterator<Item = (&str, &KeyProviderConfig)> {
        self.providers
            .iter()
            .map(|(name, provider)| (name.as_str(), provider))
    }
}

fn enabled() -> bool {
    true
}

mod duration_secs {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

mod ordered_providers {
    use std::fmt;

    use serde::de::MapAccess;
    use serde::de::Visitor;
    use serde::Deserializer;

    use super::KeyProviderConfig;

    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Vec<(String, KeyProviderConfig)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ProvidersVisitor;

        impl<'de> Visitor<'de> for ProvidersVisitor {
            type Value = Vec<(String, KeyProviderConfig)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of provider names to provider configurations")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut providers: Vec<(String, KeyProviderConfig)> = Vec::new();
                while let Some((name, provider)) = map.next_entry::<String, KeyProviderConfig>()? {
                    match providers.iter_mut().find(|(existing, _)| *existing == name) {
                        Some((_, slot)) => *slot = provider,
                        None => providers.push((name, provider)),
                    }
                }
                Ok(providers)
            }
        }

        deserializer.deserialize_map(ProvidersVisitor)
    }
}
