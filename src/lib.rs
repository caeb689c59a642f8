//! Subscription Sync - Stripe webhook ingestion and access gating
//!
//! Verifies signed Stripe webhook deliveries, mirrors subscription state
//! into a local store with an idempotent upsert, and answers whether a user
//! may currently download protected content.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
