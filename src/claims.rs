use jsonwebtoken::Header;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Trait for accessing standard JWT/OIDC claims
///
/// The caches only need the issuer, the audiences and the time claims of a
/// token, so anything exposing them can be checked generically.
pub trait StandardClaims {
    /// Get the issuer (iss) claim
    fn iss(&self) -> &str;

    /// Get the subject (sub) claim
    fn sub(&self) -> &str;

    /// Get the audience (aud) claim
    fn aud(&self) -> &[String];

    /// Get the expiration time (exp) claim as a Unix timestamp, if present
    fn exp(&self) -> Option<i64>;

    /// Get the not-before (nbf) claim as a Unix timestamp, if present
    fn nbf(&self) -> Option<i64> {
        None
    }

    /// Get the issued at (iat) claim as a Unix timestamp, if present
    fn iat(&self) -> Option<i64> {
        None
    }
}

/// Registered claims of a JWT plus every other claim it carried
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Subject
    #[serde(default)]
    pub sub: String,
    /// Audiences; a single string audience is normalized into a one-element list
    #[serde(default, deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
    /// Expiration time as Unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Not-before time as Unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    /// Issued-at time as Unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Any claim not covered above
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StandardClaims for TokenClaims {
    fn iss(&self) -> &str {
        &self.iss
    }

    fn sub(&self) -> &str {
        &self.sub
    }

    fn aud(&self) -> &[String] {
        &self.aud
    }

    fn exp(&self) -> Option<i64> {
        self.exp
    }

    fn nbf(&self) -> Option<i64> {
        self.nbf
    }

    fn iat(&self) -> Option<i64> {
        self.iat
    }
}

/// Result of checking the time claims of a token against a given time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeConstraint {
    Valid,
    NotYetValid,
    Expired,
}

/// A token whose signature and structure have been verified
///
/// Values are moved into a token cache once verified; the cache is then the
/// only owner until the entry is evicted or found expired.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    header: Header,
    claims: TokenClaims,
}

impl VerifiedToken {
    pub fn new(header: Header, claims: TokenClaims) -> Self {
        Self { header, claims }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// Check `exp` and `nbf` against `now` (seconds since the epoch)
    ///
    /// A token is expired once `exp <= now`. Tokens without an `exp` claim
    /// never expire.
    pub fn verify_time_constraint(&self, now: i64) -> TimeConstraint {
        if let Some(nbf) = self.claims.nbf {
            if nbf > now {
                return TimeConstraint::NotYetValid;
            }
        }

        match self.claims.exp {
            Some(exp) if exp <= now => TimeConstraint::Expired,
            _ => TimeConstraint::Valid,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.claims.exp, Some(exp) if exp <= now)
    }
}

impl StandardClaims for VerifiedToken {
    fn iss(&self) -> &str {
        self.claims.iss()
    }

    fn sub(&self) -> &str {
        self.claims.sub()
    }

    fn aud(&self) -> &[String] {
        self.claims.aud()
    }

    fn exp(&self) -> Option<i64> {
        self.claims.exp()
    }

    fn nbf(&self) -> Option<i64> {
        self.claims.nbf()
    }

    fn iat(&self) -> Option<i64> {
        self.claims.iat()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(aud)) => vec![aud],
        Some(OneOrMany::Many(auds)) => auds,
        None => Vec::new(),
    })
}
