//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `subscription` - Provider subscription mirror, events and entitlement

pub mod foundation;
pub mod subscription;
