//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `SubscriptionRepository` - Subscription persistence with atomic upsert
//! - `WebhookVerifier` - Provider signature verification and decoding
//! - `EventReconciler` - Applies verified events to the store
//! - `AccessGrantee` - Consumers of grant/revoke decisions

mod access_grantee;
mod event_reconciler;
mod subscription_repository;
mod webhook_verifier;

pub use access_grantee::{AccessError, AccessGrantee};
pub use event_reconciler::{EventReconciler, ReconcileOutcome};
pub use subscription_repository::{SubscriptionRepository, UpsertOutcome};
pub use webhook_verifier::WebhookVerifier;
