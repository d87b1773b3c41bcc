#![deny(missing_docs)]

//! # authgate-core — Bearer-Token Authentication Gate
//!
//! Decides, per request, whether an HTTP request may reach a protected
//! handler. The crate is transport-agnostic above `http` types: it reads
//! request parts, returns an [`Outcome`], and leaves rendering to the caller
//! through the canonical [`ErrorResponse`] contract.
//!
//! ## Design Principles
//!
//! 1. **Fixed check order.** Required headers, then `Authorization`
//!    presence, then scheme, then token emptiness, then verification. The
//!    first failing check wins and nothing after it runs.
//!
//! 2. **One error shape.** Every refusal maps through [`respond`] /
//!    [`respond_to`] to `{error, code, message, request_id?}`.
//!
//! 3. **Engine behind a trait.** Token verification is delegated to an
//!    injected [`IdentityEngine`]. Engine failure detail goes to the
//!    [`AuthEventSink`], never to the client.
//!
//! 4. **Typed context.** Handlers receive an [`AuthenticatedContext`]
//!    rather than reading string keys out of a bag.

pub mod context;
pub mod credential;
pub mod engine;
pub mod gate;
pub mod identity;
pub mod rejection;
pub mod responder;
pub mod sink;

pub use context::{AuthenticatedContext, RequestContext};
pub use credential::{
    authorization_header, BearerCredential, CredentialError, HeaderNameError, RequiredHeaderSet,
    BEARER_PREFIX,
};
pub use engine::{until_cancelled, EngineError, IdentityEngine};
pub use gate::{AuthGate, Outcome};
pub use identity::{Claims, CredentialType, Identity};
pub use rejection::{ErrorCategory, Rejection, RejectionReason};
pub use responder::{respond, respond_to, ErrorResponse};
pub use sink::{AuthEvent, AuthEventSink, EventMeta, MemorySink, TracingSink};
