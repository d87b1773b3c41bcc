//! Signed-JWT verification against a JWKS.
//!
//! Signature and time claims (`exp`, `nbf`) are checked by `jsonwebtoken`;
//! subject, issuer and audience go through the shared claim rules so both
//! verification paths agree on them.

use authgate_core::{Claims, CredentialType, EngineError, Identity};
use jsonwebtoken::jwk::KeyAlgorithm;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use tokio_util::sync::CancellationToken;

use crate::claims;
use crate::jwks::JwksCache;
use crate::settings::AudiencePolicy;

/// `source` recorded on identities verified by this path.
pub const SOURCE: &str = "jwks";

/// Verifies compact JWS tokens.
#[derive(Debug)]
pub struct JwtVerifier {
    jwks: JwksCache,
    issuer: Option<String>,
    audience: AudiencePolicy,
}

impl JwtVerifier {
    /// Verifier over `jwks` applying the given issuer and audience rules.
    pub fn new(jwks: JwksCache, issuer: Option<String>, audience: AudiencePolicy) -> Self {
        Self {
            jwks,
            issuer,
            audience,
        }
    }

    /// Verify `token` and return the identity it asserts.
    pub async fn verify(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Identity, EngineError> {
        let header = decode_header(token)
            .map_err(|e| EngineError::InvalidToken(format!("malformed JWT header: {e}")))?;
        let jwk = self.jwks.key(header.kid.as_deref(), cancel).await?;

        // A key pinned to one algorithm must not verify under another.
        if let Some(key_alg) = &jwk.common.key_algorithm {
            if signing_algorithm(key_alg) != Some(header.alg) {
                return Err(EngineError::InvalidToken(format!(
                    "token alg {:?} does not match key alg {key_alg:?}",
                    header.alg
                )));
            }
        }

        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| EngineError::InvalidToken(format!("unusable JWKS key: {e}")))?;

        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;
        validation.validate_nbf = true;

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| EngineError::InvalidToken(e.to_string()))?;

        claims::admit(
            data.claims,
            self.issuer.as_deref(),
            &self.audience,
            CredentialType::Jwt,
            SOURCE,
        )
    }
}

/// JWS algorithm a JWK `alg` pins its key to. Encryption algorithms
/// (`RSA1_5`, `RSA-OAEP`, ...) never sign tokens.
fn signing_algorithm(alg: &KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}
