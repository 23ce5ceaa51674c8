use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use reqwest::Client;

use crate::error::fetch_key_set_error;
use crate::error::Error;
use crate::error::Result;

/// Retrieves a key set from a remote source
#[async_trait]
pub trait FetchKeySet: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<JwkSet>;
}

/// Fetches JWKS documents over HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpKeySetFetcher {
    client: Client,
}

impl HttpKeySetFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchKeySet for HttpKeySetFetcher {
    async fn fetch(&self, uri: &str) -> Result<JwkSet> {
        let jwks: JwkSet = self
            .client
            .get(uri)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(fetch_key_set_error)?
            .json()
            .await
            .map_err(fetch_key_set_error)?;

        if jwks.keys.is_empty() {
            return Err(Error::EmptyKeySet);
        }

        Ok(jwks)
    }
}
