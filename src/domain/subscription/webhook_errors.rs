//! Webhook error types for provider event ingestion.
//!
//! Every failure the ingestion pipeline can report, with HTTP status code
//! mapping and retryability semantics. The provider retries on 5xx only.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook verification and reconciliation.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No signature header was sent.
    #[error("No signature provided")]
    MissingSignature,

    /// The signing secret is empty, so nothing can be verified.
    #[error("Webhook secret not configured")]
    SecretNotConfigured,

    /// Header was unparseable or no signature matched.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature timestamp is outside the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Authentic body that cannot be reconciled.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// The subscription store failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Persistence(_))
    }

    /// Returns true for the signature-verification family.
    pub fn is_signature_failure(&self) -> bool {
        matches!(
            self,
            WebhookError::MissingSignature
                | WebhookError::SecretNotConfigured
                | WebhookError::InvalidSignature
                | WebhookError::TimestampOutOfRange
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// - 4xx: rejected, no retry
    /// - 5xx: server error, provider will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature
            | WebhookError::SecretNotConfigured
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::MalformedEvent(_) => StatusCode::BAD_REQUEST,

            WebhookError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Persistence(err.to_string())
    }
}
