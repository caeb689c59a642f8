//! HTTP middleware for axum.
//!
//! - `access_token` - Shared-secret gate for the access endpoints

pub mod access_token;

pub use access_token::{AccessTokenRejection, RequireAccessToken};
