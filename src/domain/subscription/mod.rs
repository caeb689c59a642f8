//! Subscription domain.
//!
//! Local mirror of provider subscriptions, the events that drive it, and
//! the entitlement rule computed from it.

mod aggregate;
mod entitlement;
mod events;
mod status;
mod webhook_errors;

pub use aggregate::{BillingPeriod, NewSubscription, Subscription, SubscriptionChanges};
pub use entitlement::{is_entitled, Entitlement, EntitlementReason};
pub use events::{CheckoutSessionObject, ProviderEvent, SubscriptionObject, VerifiedEvent};
pub use status::SubscriptionStatus;
pub use webhook_errors::WebhookError;
