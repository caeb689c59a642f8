//! Stripe webhook signature verification.
//!
//! Implements the `WebhookVerifier` port using HMAC-SHA256 over
//! `"{t}.{raw body}"`, with a replay window on `t`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::subscription::{VerifiedEvent, WebhookError};
use crate::ports::WebhookVerifier;

use super::webhook_types::{SignatureHeader, StripeWebhookEvent};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook deliveries (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Verifier for Stripe webhook deliveries.
pub struct StripeWebhookVerifier {
    /// Webhook signing secret (whsec_...). Empty means unconfigured.
    secret: SecretString,
}

impl StripeWebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verification against an explicit clock.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> Result<VerifiedEvent, WebhookError> {
        // 1. Header present
        let signature = signature.ok_or_else(|| {
            tracing::warn!("Webhook rejected: no Stripe-Signature header");
            WebhookError::MissingSignature
        })?;

        // 2. Secret configured
        let secret = self.secret.expose_secret();
        if secret.is_empty() {
            tracing::warn!("Webhook rejected: signing secret not configured");
            return Err(WebhookError::SecretNotConfigured);
        }

        // 3. Parse header
        let header = SignatureHeader::parse(signature).map_err(|e| {
            tracing::warn!(error = %e, "Webhook rejected: unparseable signature header");
            WebhookError::InvalidSignature
        })?;

        // 4. Replay window
        // `t` is unauthenticated here; an unrepresentable age is out of range
        let age = now.checked_sub(header.timestamp);
        let in_window = age
            .map(|age| (-MAX_FUTURE_TOLERANCE_SECS..=MAX_TIMESTAMP_AGE_SECS).contains(&age))
            .unwrap_or(false);
        if !in_window {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = ?age,
                "Webhook rejected: timestamp outside tolerance"
            );
            return Err(WebhookError::TimestampOutOfRange);
        }

        // 5. Constant-time comparison against every v1 entry
        let expected = compute_signature(secret.as_bytes(), header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));
        if !matched {
            tracing::warn!(
                event_timestamp = header.timestamp,
                candidates = header.v1_signatures.len(),
                "Webhook rejected: invalid signature"
            );
            return Err(WebhookError::InvalidSignature);
        }

        // 6. Decode the authenticated body
        let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
            tracing::error!(error = %e, "Authenticated webhook body is not a Stripe event");
            WebhookError::MalformedEvent(format!("invalid event JSON: {}", e))
        })?;
        let event_id = event.id.clone();
        let event_type = event.event_type.clone();

        event.into_verified().map_err(|reason| {
            tracing::error!(
                event_id = %event_id,
                event_type = %event_type,
                reason = %reason,
                "Malformed event"
            );
            WebhookError::MalformedEvent(reason)
        })
    }
}

impl WebhookVerifier for StripeWebhookVerifier {
    fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<VerifiedEvent, WebhookError> {
        self.verify_at(payload, signature, chrono::Utc::now().timestamp())
    }
}

/// HMAC-SHA256 over `"{timestamp}."` followed by the exact body bytes.
fn compute_signature(secret: &[u8], timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| WebhookError::SecretNotConfigured)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Builds a `Stripe-Signature` header value for test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.{}", timestamp, payload).as_bytes());
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::ProviderEvent;

    const TEST_SECRET: &str = "whsec_test_secret_12345";
    const NOW: i64 = 1_700_000_300;

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    fn payload() -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": "customer.subscription.updated",
            "created": NOW,
            "livemode": false,
            "data": { "object": {
                "id": "sub_1",
                "customer": "cus_1",
                "status": "active",
                "current_period_start": 1_700_000_000,
                "current_period_end": 1_702_592_000,
                "metadata": { "user_id": "user-1" },
                "items": { "data": [ { "price": { "id": "price_1" } } ] }
            } }
        })
        .to_string()
    }

    #[test]
    fn valid_signature_is_accepted_and_decoded() {
        let body = payload();
        let header = compute_test_signature(TEST_SECRET, NOW, &body);

        let event = verifier()
            .verify_at(body.as_bytes(), Some(&header), NOW)
            .unwrap();

        assert_eq!(event.id, "evt_1");
        assert!(matches!(event.kind, ProviderEvent::SubscriptionUpdated(_)));
    }

    #[test]
    fn any_matching_v1_entry_is_accepted() {
        let body = payload();
        let good = compute_test_signature(TEST_SECRET, NOW, &body);
        let good_sig = good.split_once("v1=").unwrap().1;
        let header = format!("t={},v1={},v1={}", NOW, "00".repeat(32), good_sig);

        assert!(verifier().verify_at(body.as_bytes(), Some(&header), NOW).is_ok());
    }

    #[test]
    fn missing_header_is_rejected() {
        let result = verifier().verify_at(payload().as_bytes(), None, NOW);
        assert!(matches!(result, Err(WebhookError::MissingSignature)));
    }

    #[test]
    fn empty_secret_is_not_configured() {
        let verifier = StripeWebhookVerifier::new(SecretString::new(String::new()));
        let body = payload();
        let header = compute_test_signature("", NOW, &body);

        let result = verifier.verify_at(body.as_bytes(), Some(&header), NOW);
        assert!(matches!(result, Err(WebhookError::SecretNotConfigured)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = payload();
        let header = compute_test_signature("whsec_other", NOW, &body);

        let result = verifier().verify_at(body.as_bytes(), Some(&header), NOW);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn tampered_body_is_rejected() {
        let body = payload();
        let header = compute_test_signature(TEST_SECRET, NOW, &body);
        let tampered = body.replace("active", "trialing");

        let result = verifier().verify_at(tampered.as_bytes(), Some(&header), NOW);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn garbage_header_is_invalid_signature() {
        let result = verifier().verify_at(payload().as_bytes(), Some("not-a-header"), NOW);
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn old_timestamp_is_out_of_range() {
        let body = payload();
        let signed_at = NOW - MAX_TIMESTAMP_AGE_SECS - 1;
        let header = compute_test_signature(TEST_SECRET, signed_at, &body);

        let result = verifier().verify_at(body.as_bytes(), Some(&header), NOW);
        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn future_timestamp_beyond_skew_is_out_of_range() {
        let body = payload();
        let signed_at = NOW + MAX_FUTURE_TOLERANCE_SECS + 1;
        let header = compute_test_signature(TEST_SECRET, signed_at, &body);

        let result = verifier().verify_at(body.as_bytes(), Some(&header), NOW);
        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn extreme_timestamps_are_out_of_range_without_overflow() {
        let body = payload();
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={},v1={}", t, "00".repeat(32));
            let result = verifier().verify_at(body.as_bytes(), Some(&header), NOW);
            assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
        }
    }

    #[test]
    fn extreme_clock_with_negative_timestamp_is_out_of_range() {
        let body = payload();
        let header = format!("t={},v1={}", -1, "00".repeat(32));

        let result = verifier().verify_at(body.as_bytes(), Some(&header), i64::MAX);
        assert!(matches!(result, Err(WebhookError::TimestampOutOfRange)));
    }

    #[test]
    fn timestamp_at_window_edge_is_accepted() {
        let body = payload();
        let signed_at = NOW - MAX_TIMESTAMP_AGE_SECS;
        let header = compute_test_signature(TEST_SECRET, signed_at, &body);

        assert!(verifier().verify_at(body.as_bytes(), Some(&header), NOW).is_ok());
    }

    #[test]
    fn authentic_but_undecodable_body_is_malformed() {
        let body = r#"{"not":"an event"}"#;
        let header = compute_test_signature(TEST_SECRET, NOW, body);

        let result = verifier().verify_at(body.as_bytes(), Some(&header), NOW);
        assert!(matches!(result, Err(WebhookError::MalformedEvent(_))));
    }
}
