//! # Engine Settings
//!
//! Everything the OAuth2 engine needs to know, already parsed and typed.
//! Built from raw configuration strings with [`EngineSettings::from_raw`];
//! empty strings mean "not configured".

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use url::Url;
use zeroize::Zeroizing;

use crate::error::EngineBuildError;

/// Default timeout for JWKS and introspection calls.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a fetched JWKS document is trusted before refetching.
pub const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum gap between forced JWKS refreshes triggered by unknown key IDs.
pub const DEFAULT_JWKS_REFRESH_COOLDOWN: Duration = Duration::from_secs(10);

// ── Verification mode ───────────────────────────────────────────────────────

/// Which verification paths the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationMode {
    /// Signed JWTs checked against the JWKS only.
    JwtOnly,
    /// Every token sent to the introspection endpoint.
    OpaqueOnly,
    /// JWT-shaped tokens try JWKS first, then introspection.
    JwtAndOpaque,
}

impl VerificationMode {
    /// Pick the mode from which endpoints are configured.
    ///
    /// Exactly one source configured selects that source alone. Both, or
    /// neither, select [`VerificationMode::JwtAndOpaque`].
    pub fn select(has_jwks: bool, has_introspection: bool) -> Self {
        match (has_jwks, has_introspection) {
            (true, false) => Self::JwtOnly,
            (false, true) => Self::OpaqueOnly,
            _ => Self::JwtAndOpaque,
        }
    }
}

impl fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::JwtOnly => "jwt_only",
            Self::OpaqueOnly => "opaque_only",
            Self::JwtAndOpaque => "jwt_and_opaque",
        })
    }
}

// ── Audience policy ─────────────────────────────────────────────────────────

/// Which `aud` values a token may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudiencePolicy {
    /// Audience is not checked.
    Any,
    /// The token's audience must contain at least one of these.
    OneOf(Vec<String>),
}

impl AudiencePolicy {
    /// Parse a raw audience setting: empty or `*` means any, otherwise a
    /// comma-separated list.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Self::Any;
        }
        let list: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if list.is_empty() {
            Self::Any
        } else {
            Self::OneOf(list)
        }
    }

    /// Whether `aud` (a string, an array of strings, or absent) satisfies
    /// the policy. A restricted policy rejects tokens without `aud`.
    pub fn accepts(&self, aud: Option<&Value>) -> bool {
        let allowed = match self {
            Self::Any => return true,
            Self::OneOf(allowed) => allowed,
        };
        match aud {
            Some(Value::String(s)) => allowed.iter().any(|a| a == s),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .any(|s| allowed.iter().any(|a| a == s)),
            _ => false,
        }
    }
}

// ── Introspection client credentials ────────────────────────────────────────

/// HTTP basic credentials presented to the introspection endpoint.
///
/// The secret is zeroized on drop and redacted from `Debug`.
#[derive(Clone)]
pub struct ClientCredentials {
    /// OAuth2 client identifier.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: Zeroizing<String>,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Where and how to introspect opaque tokens.
#[derive(Debug, Clone)]
pub struct IntrospectionSettings {
    /// RFC 7662 endpoint.
    pub endpoint: Url,
    /// Basic-auth credentials, when the endpoint requires them.
    pub credentials: Option<ClientCredentials>,
}

// ── EngineSettings ──────────────────────────────────────────────────────────

/// Complete engine configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Required `iss` value, if any.
    pub issuer: Option<String>,
    /// Accepted audiences.
    pub audience: AudiencePolicy,
    /// JWKS document location, if JWT verification is enabled.
    pub jwks_url: Option<Url>,
    /// Introspection endpoint, if opaque verification is enabled.
    pub introspection: Option<IntrospectionSettings>,
    /// Timeout for each outbound HTTP call.
    pub http_timeout: Duration,
    /// JWKS cache lifetime.
    pub jwks_cache_ttl: Duration,
    /// Minimum gap between unknown-`kid` refreshes.
    pub jwks_refresh_cooldown: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: AudiencePolicy::Any,
            jwks_url: None,
            introspection: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            jwks_cache_ttl: DEFAULT_JWKS_CACHE_TTL,
            jwks_refresh_cooldown: DEFAULT_JWKS_REFRESH_COOLDOWN,
        }
    }
}

impl EngineSettings {
    /// Build settings from raw configuration strings. Empty strings mean
    /// "not configured"; client credentials are only used when `client_id`
    /// is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineBuildError::InvalidUrl`] when a non-empty URL does not
    /// parse.
    pub fn from_raw(
        issuer: &str,
        audience: &str,
        jwks_url: &str,
        introspection_url: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<Self, EngineBuildError> {
        let jwks_url = parse_optional_url("jwks_url", jwks_url)?;
        let introspection = parse_optional_url("introspection_url", introspection_url)?.map(
            |endpoint| IntrospectionSettings {
                endpoint,
                credentials: (!client_id.is_empty()).then(|| ClientCredentials {
                    client_id: client_id.to_string(),
                    client_secret: Zeroizing::new(client_secret.to_string()),
                }),
            },
        );

        Ok(Self {
            issuer: Some(issuer.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            audience: AudiencePolicy::parse(audience),
            jwks_url,
            introspection,
            ..Self::default()
        })
    }

    /// Verification mode implied by the configured endpoints.
    pub fn mode(&self) -> VerificationMode {
        VerificationMode::select(self.jwks_url.is_some(), self.introspection.is_some())
    }
}

fn parse_optional_url(field: &'static str, raw: &str) -> Result<Option<Url>, EngineBuildError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Url::parse(raw)
        .map(Some)
        .map_err(|e| EngineBuildError::InvalidUrl {
            field,
            reason: e.to_string(),
        })
}
