//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod subscription;

pub use subscription::{
    AccessAction, AccessGate, GranteeFailure, HandleWebhookCommand, HandleWebhookHandler,
    HandleWebhookResult, SubscriptionReconciler, SyncAccessHandler, SyncAccessResult,
};
