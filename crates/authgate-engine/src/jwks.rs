//! # JWKS Cache
//!
//! Fetches the issuer's JSON Web Key Set and keeps it for a fixed TTL.
//! A lookup for an unknown `kid` forces one refetch (subject to a cooldown,
//! so a stream of forged key IDs cannot turn into a stream of fetches).
//!
//! The lock is never held across an await; concurrent misses may fetch
//! twice, and the later write wins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use authgate_core::{until_cancelled, EngineError};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use url::Url;

const ENDPOINT: &str = "jwks";

#[derive(Debug)]
struct Cached {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// TTL cache over a remote JWKS document.
#[derive(Debug)]
pub struct JwksCache {
    http: reqwest::Client,
    url: Url,
    ttl: Duration,
    refresh_cooldown: Duration,
    cached: RwLock<Option<Cached>>,
}

impl JwksCache {
    /// Create an empty cache; nothing is fetched until the first lookup.
    pub fn new(http: reqwest::Client, url: Url, ttl: Duration, refresh_cooldown: Duration) -> Self {
        Self {
            http,
            url,
            ttl,
            refresh_cooldown,
            cached: RwLock::new(None),
        }
    }

    /// Find the key for `kid`.
    ///
    /// With no `kid`, a set holding exactly one key yields that key.
    pub async fn key(&self, kid: Option<&str>, cancel: &CancellationToken) -> Result<Jwk, EngineError> {
        let (keys, age) = match self.fresh() {
            Some((keys, age)) => (keys, Some(age)),
            None => (self.refresh(cancel).await?, None),
        };
        if let Some(key) = select(&keys, kid) {
            return Ok(key.clone());
        }

        // Unknown kid: the issuer may have rotated keys since our last fetch.
        if kid.is_some() && age.is_some_and(|age| age >= self.refresh_cooldown) {
            tracing::debug!(kid = kid.unwrap_or_default(), url = %self.url, "unknown kid, refreshing JWKS");
            let keys = self.refresh(cancel).await?;
            if let Some(key) = select(&keys, kid) {
                return Ok(key.clone());
            }
        }

        Err(EngineError::InvalidToken(match kid {
            Some(kid) => format!("no JWKS key with kid {kid}"),
            None => "token has no kid and JWKS holds several keys".into(),
        }))
    }

    fn fresh(&self) -> Option<(Arc<JwkSet>, Duration)> {
        let guard = self.cached.read();
        let cached = guard.as_ref()?;
        let age = cached.fetched_at.elapsed();
        (age < self.ttl).then(|| (Arc::clone(&cached.keys), age))
    }

    async fn refresh(&self, cancel: &CancellationToken) -> Result<Arc<JwkSet>, EngineError> {
        let keys = Arc::new(until_cancelled(cancel, self.fetch()).await?);
        *self.cached.write() = Some(Cached {
            keys: Arc::clone(&keys),
            fetched_at: Instant::now(),
        });
        tracing::debug!(url = %self.url, keys = keys.keys.len(), "JWKS fetched");
        Ok(keys)
    }

    async fn fetch(&self) -> Result<JwkSet, EngineError> {
        let resp = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(upstream(format!("status {status}")));
        }

        resp.json::<JwkSet>()
            .await
            .map_err(|e| upstream(format!("malformed JWKS: {e}")))
    }
}

fn select<'a>(keys: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => keys.find(kid),
        None if keys.keys.len() == 1 => keys.keys.first(),
        None => None,
    }
}

fn upstream(reason: String) -> EngineError {
    EngineError::Upstream {
        endpoint: ENDPOINT.into(),
        reason,
    }
}
