//! # OAuth2 Engine
//!
//! [`IdentityEngine`] implementation combining the JWKS and introspection
//! paths according to the configured [`VerificationMode`].
//!
//! In `JwtAndOpaque` mode a token shaped like a compact JWS is tried
//! against the JWKS first; if that fails and an introspection endpoint is
//! configured, the token is introspected. Anything else goes straight to
//! introspection. Cancellation is never retried.

use async_trait::async_trait;
use authgate_core::{EngineError, Identity, IdentityEngine};
use tokio_util::sync::CancellationToken;

use crate::claims::looks_like_jwt;
use crate::error::EngineBuildError;
use crate::introspection::Introspector;
use crate::jwks::JwksCache;
use crate::jwt::JwtVerifier;
use crate::settings::{EngineSettings, VerificationMode};

/// OAuth2 bearer-token engine.
#[derive(Debug)]
pub struct OAuth2Engine {
    mode: VerificationMode,
    jwt: Option<JwtVerifier>,
    introspection: Option<Introspector>,
}

impl OAuth2Engine {
    /// Build the engine and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`EngineBuildError::HttpClient`] if the client cannot be built.
    pub fn new(settings: EngineSettings) -> Result<Self, EngineBuildError> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .map_err(EngineBuildError::HttpClient)?;

        let mode = settings.mode();
        if settings.jwks_url.is_none() && settings.introspection.is_none() {
            tracing::warn!(
                "neither jwks_url nor introspection_url configured; every token will be rejected"
            );
        }

        let jwt = settings.jwks_url.map(|url| {
            JwtVerifier::new(
                JwksCache::new(
                    http.clone(),
                    url,
                    settings.jwks_cache_ttl,
                    settings.jwks_refresh_cooldown,
                ),
                settings.issuer.clone(),
                settings.audience.clone(),
            )
        });
        let introspection = settings.introspection.map(|intro| {
            Introspector::new(http, intro, settings.issuer, settings.audience)
        });

        tracing::info!(
            mode = %mode,
            jwks = jwt.is_some(),
            introspection = introspection.is_some(),
            "identity engine initialised"
        );

        Ok(Self {
            mode,
            jwt,
            introspection,
        })
    }

    /// Active verification mode.
    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    async fn verify_jwt(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, EngineError> {
        match &self.jwt {
            Some(jwt) => jwt.verify(token, cancel).await,
            None => Err(EngineError::NotConfigured("jwks_url".into())),
        }
    }

    async fn verify_opaque(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, EngineError> {
        match &self.introspection {
            Some(intro) => intro.verify(token, cancel).await,
            None => Err(EngineError::NotConfigured("introspection_url".into())),
        }
    }
}

#[async_trait]
impl IdentityEngine for OAuth2Engine {
    async fn verify(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, EngineError> {
        match self.mode {
            VerificationMode::JwtOnly => self.verify_jwt(token, cancel).await,
            VerificationMode::OpaqueOnly => self.verify_opaque(token, cancel).await,
            VerificationMode::JwtAndOpaque => {
                if self.jwt.is_some() && looks_like_jwt(token) {
                    match self.verify_jwt(token, cancel).await {
                        Ok(identity) => return Ok(identity),
                        Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
                        Err(err) if self.introspection.is_none() => return Err(err),
                        Err(err) => {
                            tracing::debug!(error = %err, "JWT verification failed, trying introspection");
                        }
                    }
                }
                self.verify_opaque(token, cancel).await
            }
        }
    }
}
