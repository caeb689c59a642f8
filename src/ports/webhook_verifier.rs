//! Webhook verifier port.
//!
//! Authenticates a raw provider delivery and decodes it. Nothing downstream
//! ever sees a body that has not passed through here.

use crate::domain::subscription::{VerifiedEvent, WebhookError};

/// Port for verifying and decoding provider webhook deliveries.
///
/// Synchronous: verification is pure CPU work over bytes already in memory.
pub trait WebhookVerifier: Send + Sync {
    /// Verify `signature` over the exact `payload` bytes, then decode.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` if `signature` is `None`
    /// - `SecretNotConfigured` if no signing secret is set
    /// - `InvalidSignature` / `TimestampOutOfRange` on verification failure
    /// - `MalformedEvent` if an authentic body cannot be decoded
    fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<VerifiedEvent, WebhookError>;
}
