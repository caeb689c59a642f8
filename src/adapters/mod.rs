//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `access` - Grant/revoke callbacks
//! - `http` - Axum routes
//! - `postgres` - Subscription store
//! - `storage` - In-memory subscription store
//! - `stripe` - Webhook signature verification and payload decoding

pub mod access;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod stripe;
