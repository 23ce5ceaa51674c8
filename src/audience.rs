use std::collections::HashSet;

/// Checks token audiences against the audiences configured for a provider
///
/// Audiences are compared after stripping an `http://` or `https://` scheme
/// prefix and a trailing slash, so `https://api.example.com/` and
/// `api.example.com` are the same audience. An empty configured list accepts
/// every token.
#[derive(Debug, Clone, Default)]
pub struct AudienceMatcher {
    allowed: HashSet<String>,
}

impl AudienceMatcher {
    pub fn new<I, S>(audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: audiences
                .into_iter()
                .map(|aud| normalize(aud.as_ref()).to_string())
                .collect(),
        }
    }

    /// Returns true if any of the token's audiences is allowed
    pub fn are_audiences_allowed(&self, audiences: &[String]) -> bool {
        if self.allowed.is_empty() {
            return true;
        }

        audiences
            .iter()
            .any(|aud| self.allowed.contains(normalize(aud)))
    }
}

fn normalize(audience: &str) -> &str {
    let audience = audience
        .strip_prefix("http://")
        .or_else(|| audience.strip_prefix("https://"))
        .unwrap_or(audience);
    audience.strip_suffix('/').unwrap_or(audience)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auds(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_configuration_allows_everything() {
        let matcher = AudienceMatcher::new(Vec::<String>::new());

        assert!(matcher.are_audiences_allowed(&auds(&["anything"])));
        assert!(matcher.are_audiences_allowed(&[]));
    }

    #[test]
    fn any_matching_audience_is_enough() {
        let matcher = AudienceMatcher::new(["svc-a", "svc-b"]);

        assert!(matcher.are_audiences_allowed(&auds(&["other", "svc-b"])));
        assert!(!matcher.are_audiences_allowed(&auds(&["other"])));
        assert!(!matcher.are_audiences_allowed(&[]));
    }

    #[test]
    fn scheme_and_trailing_slash_are_ignored() {
        let matcher = AudienceMatcher::new(["https://api.example.com/"]);

        assert!(matcher.are_audiences_allowed(&auds(&["api.example.com"])));
        assert!(matcher.are_audiences_allowed(&auds(&["http://api.example.com"])));
        assert!(!matcher.are_audiences_allowed(&auds(&["api.example.org"])));
    }
}
