//! # Middleware
//!
//! Global layers (outermost first): [`request_id`] → [`logger`] → request
//! timeout. Protected routes add [`auth`] underneath.

pub mod auth;
pub mod logger;
pub mod request_id;

pub use auth::auth_middleware;
pub use logger::logger_middleware;
pub use request_id::{request_id_middleware, request_id_of, REQUEST_ID_HEADER};
