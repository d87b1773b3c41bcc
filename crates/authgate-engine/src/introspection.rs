//! RFC 7662 token introspection.

use authgate_core::{until_cancelled, Claims, CredentialType, EngineError, Identity};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::claims;
use crate::settings::{AudiencePolicy, IntrospectionSettings};

/// `source` recorded on identities verified by this path.
pub const SOURCE: &str = "introspection";

const ENDPOINT: &str = "introspection";

/// Client for an introspection endpoint.
#[derive(Debug)]
pub struct Introspector {
    http: reqwest::Client,
    settings: IntrospectionSettings,
    issuer: Option<String>,
    audience: AudiencePolicy,
}

impl Introspector {
    /// Introspector for `settings` applying the given issuer and audience rules.
    pub fn new(
        http: reqwest::Client,
        settings: IntrospectionSettings,
        issuer: Option<String>,
        audience: AudiencePolicy,
    ) -> Self {
        Self {
            http,
            settings,
            issuer,
            audience,
        }
    }

    /// Ask the endpoint about `token`. Only an active token with acceptable
    /// claims yields an identity.
    pub async fn verify(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, EngineError> {
        let claims = until_cancelled(cancel, self.introspect(token)).await?;

        if claims.get("active").and_then(Value::as_bool) != Some(true) {
            return Err(EngineError::InvalidToken("token is not active".into()));
        }

        claims::admit(
            claims,
            self.issuer.as_deref(),
            &self.audience,
            CredentialType::Opaque,
            SOURCE,
        )
    }

    async fn introspect(&self, token: &str) -> Result<Claims, EngineError> {
        let mut req = self
            .http
            .post(self.settings.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("token", token), ("token_type_hint", "access_token")]);
        if let Some(creds) = &self.settings.credentials {
            req = req.basic_auth(&creds.client_id, Some(creds.client_secret.as_str()));
        }

        let resp = req.send().await.map_err(|e| upstream(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(upstream(format!("status {status}")));
        }

        resp.json::<Claims>()
            .await
            .map_err(|e| upstream(format!("malformed introspection response: {e}")))
    }
}

fn upstream(reason: String) -> EngineError {
    EngineError::Upstream {
        endpoint: ENDPOINT.into(),
        reason,
    }
}
