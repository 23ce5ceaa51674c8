use std::path::Path;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid key set: {0}")]
    KeySetParse(#[from] serde_json::Error),
    #[error("The key set does not contain any keys")]
    EmptyKeySet,
    #[error("Failed to read local key set: {0}")]
    LocalKeySetRead(String),
    #[error("Key set fetch error: {0}")]
    KeySetFetch(String),
    #[error("No key provider is configured for issuer: {0}")]
    UnknownIssuer(String),
    #[error("The provided JWT does not match the expected issuer. Provided issuer: {0}")]
    WrongIssuer(String),
    #[error("The provided JWT has expired. Expiration timestamp: {0}")]
    TokenExpired(i64),
    #[error("The provided JWT is not yet valid. Not-before timestamp: {0}")]
    TokenNotYetValid(i64),
    #[error("The audiences of the provided JWT are not allowed: {0:?}")]
    AudienceNotAllowed(Vec<String>),
    #[error("Missing 'kid' in the header of the provided JWT")]
    KeyIdMissing,
    #[error("Key of your provided JWT does not match in JWKs")]
    KeyNotMatchInJwks,
    #[error("No key set is available for provider: {0}")]
    KeySetUnavailable(String),
}

pub(crate) fn fetch_key_set_error(error: reqwest::Error) -> Error {
    Error::KeySetFetch(format!("Failed to fetch JWKS: {error}"))
}

pub(crate) fn local_key_set_error(path: &Path, error: std::io::Error) -> Error {
    Error::LocalKeySetRead(format!("{}: {error}", path.display()))
}
