use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::dangerous;
use jsonwebtoken::decode;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::TokenData;
use jsonwebtoken::Validation;
use tracing::debug;
use tracing::warn;

use crate::claims::StandardClaims;
use crate::claims::TimeConstraint;
use crate::claims::TokenClaims;
use crate::claims::VerifiedToken;
use crate::clock::SystemTimeSource;
use crate::clock::TimeSource;
use crate::config::AuthConfig;
use crate::error::Error;
use crate::error::Result;
use crate::fetcher::FetchKeySet;
use crate::fetcher::HttpKeySetFetcher;
use crate::jwks_cache::KeyProviderCache;
use crate::key_provider::KeyProviderEntry;

/// Trait for JWT verification
#[async_trait]
pub trait VerifyJwt {
    /// Verify a JWT token, selecting the key provider by the token's issuer
    async fn verify(&self, token: &str) -> Result<VerifiedToken>;
}

/// JWT verifier backed by per-provider key set and verified-token caches
///
/// A token that was verified before and has not expired is answered from the
/// provider's token cache without checking its signature again. Key sets are
/// fetched only when missing or past their deadline.
pub struct JwtAuthenticator<F: FetchKeySet = HttpKeySetFetcher> {
    providers: KeyProviderCache,
    fetcher: F,
    time_source: Arc<dyn TimeSource>,
}

impl JwtAuthenticator<HttpKeySetFetcher> {
    /// Create an authenticator that fetches remote key sets over HTTP
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_fetcher(config, HttpKeySetFetcher::default(), Arc::new(SystemTimeSource))
    }
}

impl<F: FetchKeySet> JwtAuthenticator<F> {
    /// Create an authenticator with a custom key set fetcher and time source
    pub fn with_fetcher(config: &AuthConfig, fetcher: F, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            providers: KeyProviderCache::new(config, Arc::clone(&time_source)),
            fetcher,
            time_source,
        }
    }

    pub fn providers(&self) -> &KeyProviderCache {
        &self.providers
    }

    /// Verify a token against a provider selected by name
    ///
    /// # Panics
    ///
    /// Panics if `provider` is not part of the configuration.
    pub async fn verify_with_provider(&self, provider: &str, token: &str) -> Result<VerifiedToken> {
        let entry = self.providers.find_by_provider(provider);
        let token_data = parse_token_data(token)?;

        if !entry.issuer().is_empty() && entry.issuer() != token_data.claims.iss() {
            return Err(Error::WrongIssuer(token_data.claims.iss));
        }

        self.verify_with_entry(entry, token_data, token).await
    }

    async fn verify_with_entry(
        &self,
        entry: &KeyProviderEntry,
        token_data: TokenData<TokenClaims>,
        token: &str,
    ) -> Result<VerifiedToken> {
        let cached = entry.token_cache().lookup(token).cloned();
        if let Some(verified) = cached {
            debug!(provider = %entry.name(), "Token found in verification cache");
            return Ok(verified);
        }

        let jwks = self.key_set_for(entry).await?;
        let verified = validate_jwt(&token_data.header, token, &jwks)?;

        match verified.verify_time_constraint(self.time_source.now_seconds()) {
            TimeConstraint::Valid => {}
            TimeConstraint::Expired => {
                return Err(Error::TokenExpired(verified.exp().unwrap_or_default()));
            }
            TimeConstraint::NotYetValid => {
                return Err(Error::TokenNotYetValid(verified.nbf().unwrap_or_default()));
            }
        }

        if !entry.matches_audiences(verified.aud()) {
            return Err(Error::AudienceNotAllowed(verified.aud().to_vec()));
        }

        entry.token_cache().insert(token, verified.clone());
        Ok(verified)
    }

    /// Current key set of the provider, fetching it if missing or expired
    async fn key_set_for(&self, entry: &KeyProviderEntry) -> Result<Arc<JwkSet>> {
        if let Some(jwks) = usable_key_set(entry) {
            return Ok(jwks);
        }

        let Some(remote) = entry.config().remote_jwks.as_ref() else {
            return Err(Error::KeySetUnavailable(entry.name().to_string()));
        };

        let _refresh = entry.refresh_lock().lock().await;

        // Another request may have completed the refresh while we waited
        if let Some(jwks) = usable_key_set(entry) {
            return Ok(jwks);
        }

        debug!(provider = %entry.name(), uri = %remote.uri, "Fetching remote key set");
        let jwks = self.fetcher.fetch(&remote.uri).await.map_err(|error| {
            warn!(provider = %entry.name(), uri = %remote.uri, %error, "Key set fetch failed");
            error
        })?;

        Ok(entry.set_remote_key_set(jwks))
    }
}

#[async_trait]
impl<F: FetchKeySet> VerifyJwt for JwtAuthenticator<F> {
    async fn verify(&self, token: &str) -> Result<VerifiedToken> {
        let token_data = parse_token_data(token)?;
        let entry = self
            .providers
            .find_by_issuer(token_data.claims.iss())
            .ok_or_else(|| Error::UnknownIssuer(token_data.claims.iss.clone()))?;

        self.verify_with_entry(entry, token_data, token).await
    }
}

fn usable_key_set(entry: &KeyProviderEntry) -> Option<Arc<JwkSet>> {
    if entry.is_expired() {
        return None;
    }
    entry.key_set()
}

/// Parse token data without signature validation to extract header and claims
fn parse_token_data(token: &str) -> Result<TokenData<TokenClaims>> {
    // Only used to pick the provider and key; the signature is checked in validate_jwt()
    Ok(dangerous::insecure_decode::<TokenClaims>(token)?)
}

/// Validate the signature of the token against the key set
///
/// Time claims and audiences are checked by the caller so that they follow
/// the injected time source and the provider's audience rules.
fn validate_jwt(header: &Header, token: &str, jwks: &JwkSet) -> Result<VerifiedToken> {
    let mut validation = Validation::new(header.alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let candidates: Vec<&Jwk> = match header.kid.as_deref() {
        Some(kid) => vec![jwks.find(kid).ok_or(Error::KeyNotMatchInJwks)?],
        None => jwks.keys.iter().collect(),
    };

    let mut last_error = Error::KeyIdMissing;
    for jwk in candidates {
        let result = DecodingKey::from_jwk(jwk)
            .and_then(|key| decode::<TokenClaims>(token, &key, &validation));
        match result {
            Ok(token_data) => return Ok(VerifiedToken::new(token_data.header, token_data.claims)),
            Err(error) => last_error = Error::Jwt(error),
        }
    }

    Err(last_error)
}
