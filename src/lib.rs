//! # jwt-authn-cache
//!
//! Caching layer for the token-verification path of a JWT authentication
//! component.
//!
//! Two caches keep repeated work off the request path:
//!
//! - a per-provider key set cache: each configured key provider holds its
//!   parsed JWKS together with an expiration deadline. Locally configured key
//!   sets never expire, fetched ones expire after the provider's cache
//!   duration (600 seconds by default).
//! - a per-provider verified-token cache: a bounded LRU map from the raw token
//!   string to the verified token. Expired tokens are dropped lazily when a
//!   lookup finds them.
//!
//! Providers are looked up either by their configured name or by issuer. When
//! several providers share an issuer the first one in configuration order
//! serves issuer lookups, and a provider with an empty issuer catches every
//! issuer that has no provider of its own.
//!
//! [`JwtAuthenticator`] ties the caches to signature verification and remote
//! key set fetching.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use jwt_authn_cache::{AuthConfig, JwtAuthenticator, KeyProviderConfig, VerifyJwt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::new().with_provider(
//!         "corp",
//!         KeyProviderConfig::new("https://login.example.com")
//!             .with_audience("my-service")
//!             .with_remote_jwks("https://login.example.com/jwks.json")
//!             .with_cache_duration(Duration::from_secs(300))
//!             .with_token_cache_size(500),
//!     );
//!
//!     let authenticator = JwtAuthenticator::new(&config);
//!
//!     let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9...";
//!     let verified = authenticator.verify(token).await?;
//!     println!("Subject: {}", verified.claims().sub);
//!
//!     Ok(())
//! }
//! ```

mod audience;
mod claims;
mod clock;
mod config;
mod error;
mod fetcher;
mod jwks_cache;
mod key_provider;
mod key_set;
mod token_cache;
mod verifier;

// Re-exports for public API
pub use audience::AudienceMatcher;
pub use claims::StandardClaims;
pub use claims::TimeConstraint;
pub use claims::TokenClaims;
pub use claims::VerifiedToken;
pub use clock::ManualTimeSource;
pub use clock::SystemTimeSource;
pub use clock::TimeSource;
pub use config::AuthConfig;
pub use config::KeyProviderConfig;
pub use config::LocalJwks;
pub use config::RemoteJwks;
pub use config::DEFAULT_KEY_SET_CACHE_DURATION;
pub use config::DEFAULT_TOKEN_CACHE_SIZE;
pub use error::Error;
pub use error::Result;
pub use fetcher::FetchKeySet;
pub use fetcher::HttpKeySetFetcher;
pub use jwks_cache::KeyProviderCache;
pub use key_provider::KeyProviderEntry;
pub use key_set::parse_key_set;
pub use key_set::Deadline;
pub use key_set::KeySetRecord;
pub use token_cache::TokenVerificationCache;
pub use verifier::JwtAuthenticator;
pub use verifier::VerifyJwt;
