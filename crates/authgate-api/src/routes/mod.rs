//! # Routes
//!
//! | Path | Module | Gate |
//! |---|---|---|
//! | `/healthz` | [`health`] | public |
//! | `/readyz` | [`health`] | public |
//! | `/me` | [`me`] | protected |

pub mod health;
pub mod me;
