#![deny(missing_docs)]

//! # authgate-engine — OAuth2 Identity Engine
//!
//! Concrete [`authgate_core::IdentityEngine`] that verifies bearer tokens
//! either as signed JWTs (keys from a JWKS endpoint) or as opaque tokens
//! (RFC 7662 introspection), selected by which endpoints are configured.
//!
//! | Configured | Mode |
//! |---|---|
//! | JWKS only | [`VerificationMode::JwtOnly`] |
//! | introspection only | [`VerificationMode::OpaqueOnly`] |
//! | both, or neither | [`VerificationMode::JwtAndOpaque`] |
//!
//! All outbound calls share one `reqwest` client with a per-call timeout,
//! and race the caller's cancellation token.

pub mod claims;
pub mod error;
pub mod introspection;
pub mod jwks;
pub mod jwt;
pub mod oauth2;
pub mod settings;

pub use error::EngineBuildError;
pub use oauth2::OAuth2Engine;
pub use settings::{
    AudiencePolicy, ClientCredentials, EngineSettings, IntrospectionSettings, VerificationMode,
};
