//! Subscription handlers.
//!
//! ## Commands
//! - Handling provider webhook deliveries
//! - Reconciling verified events into the store
//! - Syncing access to grantees
//!
//! ## Queries
//! - Checking a user's entitlement

mod check_entitlement;
mod handle_webhook;
mod reconcile;
mod sync_access;

// Commands
pub use handle_webhook::{HandleWebhookCommand, HandleWebhookHandler, HandleWebhookResult};
pub use reconcile::SubscriptionReconciler;
pub use sync_access::{AccessAction, GranteeFailure, SyncAccessHandler, SyncAccessResult};

// Queries
pub use check_entitlement::AccessGate;
