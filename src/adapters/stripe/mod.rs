//! Stripe webhook adapter.
//!
//! Implements the `WebhookVerifier` port for Stripe deliveries.
//!
//! # Security
//!
//! - Webhook signatures use HMAC-SHA256 with constant-time comparison
//! - Timestamps are validated to prevent replay attacks (5-minute window)
//! - The signing secret is held as `secrecy::SecretString`

mod webhook_types;
mod webhook_verifier;

pub use webhook_types::{
    SignatureHeader, SignatureParseError, StripeCheckoutSession, StripeSubscription,
    StripeWebhookEvent,
};
pub use webhook_verifier::StripeWebhookVerifier;

#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
