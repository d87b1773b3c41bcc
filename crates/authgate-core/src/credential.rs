//! # Request Credentials
//!
//! The two pieces of request input the gate inspects before it ever talks
//! to an identity engine: the configured set of required headers, and the
//! bearer token carried in `Authorization`.

use std::fmt;

use http::header::{HeaderMap, HeaderName, AUTHORIZATION};
use http::HeaderValue;

/// Literal scheme prefix accepted in the `Authorization` header.
///
/// Case-sensitive, exactly one space.
pub const BEARER_PREFIX: &str = "Bearer ";

// ── RequiredHeaderSet ───────────────────────────────────────────────────────

/// Ordered list of header names every protected request must carry with a
/// non-empty value.
///
/// Order is significant: when several headers are missing, the first one in
/// this list is the one reported.
///
/// Names are validated once at construction; lookups use the parsed
/// [`HeaderName`], reports use the name as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredHeaderSet {
    names: Vec<String>,
    headers: Vec<HeaderName>,
}

/// A configured required header is not a valid HTTP field name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid header name {0:?}")]
pub struct HeaderNameError(pub String);

impl RequiredHeaderSet {
    /// Build a set from header names, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderNameError`] for the first name that is not a valid
    /// HTTP field name (spaces, colons, non-ASCII and so on).
    pub fn new<I, S>(names: I) -> Result<Self, HeaderNameError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::default();
        for name in names {
            let name = name.into();
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HeaderNameError(name.clone()))?;
            set.headers.push(header);
            set.names.push(name);
        }
        Ok(set)
    }

    /// An empty set; the header precondition never rejects.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return the first name, in declared order, whose header is absent or
    /// empty in `headers`.
    pub fn first_missing(&self, headers: &HeaderMap) -> Option<&str> {
        self.headers
            .iter()
            .zip(&self.names)
            .find(|(header, _)| !is_present(headers.get(*header)))
            .map(|(_, name)| name.as_str())
    }

    /// Declared header names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether no headers are required.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn is_present(value: Option<&HeaderValue>) -> bool {
    value.is_some_and(|v| !v.as_bytes().is_empty())
}

/// Read the `Authorization` header, treating an empty value as absent.
pub fn authorization_header(headers: &HeaderMap) -> Option<&HeaderValue> {
    headers
        .get(AUTHORIZATION)
        .filter(|v| !v.as_bytes().is_empty())
}

// ── BearerCredential ────────────────────────────────────────────────────────

/// Why an `Authorization` value could not be turned into a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The value does not start with [`BEARER_PREFIX`].
    #[error("unsupported authorization scheme, expected Bearer")]
    UnsupportedScheme,
    /// The prefix matched but nothing follows it.
    #[error("empty bearer token")]
    EmptyToken,
}

/// Raw bearer token taken from an `Authorization` header.
///
/// `Debug` redacts the token so credentials never reach log output.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    /// Extract the token from an `Authorization` header value.
    ///
    /// HTTP parsers strip trailing whitespace from header values, so a
    /// client sending `"Bearer "` arrives as `"Bearer"`; both forms are an
    /// empty token rather than a foreign scheme.
    pub fn extract(value: &HeaderValue) -> Result<Self, CredentialError> {
        let raw = value
            .to_str()
            .map_err(|_| CredentialError::UnsupportedScheme)?;
        Self::parse(raw)
    }

    /// Extract the token from a header value already decoded as text.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        if raw == BEARER_PREFIX.trim_end() {
            return Err(CredentialError::EmptyToken);
        }
        let token = raw
            .strip_prefix(BEARER_PREFIX)
            .ok_or(CredentialError::UnsupportedScheme)?;
        if token.is_empty() {
            return Err(CredentialError::EmptyToken);
        }
        Ok(Self(token.to_string()))
    }

    /// The token text, without the scheme prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerCredential([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn first_missing_follows_declared_order() {
        let set = RequiredHeaderSet::new(["X-Tenant", "X-Region"]).unwrap();
        let map = headers(&[]);
        assert_eq!(set.first_missing(&map), Some("X-Tenant"));

        let map = headers(&[("x-tenant", "acme")]);
        assert_eq!(set.first_missing(&map), Some("X-Region"));

        let map = headers(&[("x-region", "eu"), ("x-tenant", "acme")]);
        assert_eq!(set.first_missing(&map), None);
    }

    #[test]
    fn empty_header_value_counts_as_missing() {
        let set = RequiredHeaderSet::new(["X-Tenant"]).unwrap();
        let map = headers(&[("x-tenant", "")]);
        assert_eq!(set.first_missing(&map), Some("X-Tenant"));
    }

    #[test]
    fn header_names_match_case_insensitively() {
        let set = RequiredHeaderSet::new(["X-TENANT"]).unwrap();
        assert_eq!(set.first_missing(&headers(&[("x-tenant", "acme")])), None);
        assert_eq!(set.names(), ["X-TENANT".to_string()]);
    }

    #[test]
    fn malformed_header_names_are_refused() {
        for bad in ["X Tenant", "X-Tenant:", "", "Tenänt"] {
            assert_eq!(
                RequiredHeaderSet::new(["X-Ok", bad]),
                Err(HeaderNameError(bad.to_string()))
            );
        }
    }

    #[test]
    fn empty_set_never_reports_missing() {
        let set = RequiredHeaderSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.first_missing(&HeaderMap::new()), None);
    }

    #[test]
    fn authorization_header_ignores_empty_value() {
        assert!(authorization_header(&headers(&[("authorization", "")])).is_none());
        assert!(authorization_header(&headers(&[("authorization", "Bearer x")])).is_some());
        assert!(authorization_header(&HeaderMap::new()).is_none());
    }

    #[test]
    fn parse_accepts_bearer_prefix() {
        let cred = BearerCredential::parse("Bearer tok123").unwrap();
        assert_eq!(cred.as_str(), "tok123");
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(
            BearerCredential::parse("bearer tok123"),
            Err(CredentialError::UnsupportedScheme)
        );
        assert_eq!(
            BearerCredential::parse("Basic xyz"),
            Err(CredentialError::UnsupportedScheme)
        );
    }

    #[test]
    fn parse_rejects_empty_remainder() {
        assert_eq!(
            BearerCredential::parse("Bearer "),
            Err(CredentialError::EmptyToken)
        );
        assert_eq!(
            BearerCredential::parse("Bearer"),
            Err(CredentialError::EmptyToken)
        );
    }

    #[test]
    fn extract_rejects_non_text_value() {
        let value = HeaderValue::from_bytes(b"Bearer \xff").unwrap();
        assert_eq!(
            BearerCredential::extract(&value),
            Err(CredentialError::UnsupportedScheme)
        );
    }

    #[test]
    fn debug_redacts_token() {
        let cred = BearerCredential::parse("Bearer super-secret").unwrap();
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
