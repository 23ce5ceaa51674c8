use std::sync::Arc;
use std::time::Instant;

use jsonwebtoken::jwk::JwkSet;

use crate::error::Error;
use crate::error::Result;

/// Parse a JSON Web Key Set document
///
/// A document that parses but holds no keys is rejected, since it could never
/// verify a token.
pub fn parse_key_set(jwks: &str) -> Result<JwkSet> {
    let key_set: JwkSet = serde_json::from_str(jwks)?;
    if key_set.keys.is_empty() {
        return Err(Error::EmptyKeySet);
    }
    Ok(key_set)
}

/// Point in monotonic time after which a key set must be refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Locally configured key sets are trusted for the life of the process
    Never,
    At(Instant),
}

impl Deadline {
    pub fn has_passed(&self, now: Instant) -> bool {
        match self {
            Deadline::Never => false,
            Deadline::At(deadline) => *deadline <= now,
        }
    }
}

/// A parsed key set together with its expiration deadline
#[derive(Debug, Clone)]
pub struct KeySetRecord {
    key_set: Arc<JwkSet>,
    deadline: Deadline,
}

impl KeySetRecord {
    pub(crate) fn new(key_set: JwkSet, deadline: Deadline) -> Self {
        Self {
            key_set: Arc::new(key_set),
            deadline,
        }
    }

    pub fn key_set(&self) -> &Arc<JwkSet> {
        &self.key_set
    }

    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.has_passed(now)
    }
}
