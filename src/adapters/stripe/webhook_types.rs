//! Stripe-specific types for webhook handling.
//!
//! These types represent Stripe API objects as they arrive in webhook
//! payloads, and map them onto the domain's event shapes.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{
    CheckoutSessionObject, ProviderEvent, SubscriptionObject, SubscriptionStatus, VerifiedEvent,
};

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty.
    Empty,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// No v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Signature is not valid hex.
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty Stripe-Signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed Stripe-Signature header components.
///
/// Format: `t=<timestamp>,v1=<signature>[,v1=<signature>][,v0=<legacy>]`.
/// Stripe sends several `v1` entries while a secret is being rolled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe signed the delivery.
    pub timestamp: i64,

    /// HMAC-SHA256 signatures, hex-decoded.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.trim().is_empty() {
            return Err(SignatureParseError::Empty);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex::decode(value.trim())
                            .map_err(|_| SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {
                    // Ignore v0 and unknown fields for forward compatibility
                }
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Stripe Event Types
// ════════════════════════════════════════════════════════════════════════════════

/// Raw Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeWebhookEvent {
    /// Unique event identifier (evt_...).
    pub id: String,

    /// Event type (e.g., "customer.subscription.updated").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    pub api_version: Option<String>,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    /// The object affected by this event.
    pub object: serde_json::Value,
}

/// Stripe Checkout Session object (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub mode: Option<String>,
    pub payment_status: Option<String>,
}

/// Stripe Subscription object (subset).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer ID owning this subscription.
    pub customer: String,

    pub status: String,

    /// Absent on newer API versions, where it lives on the items.
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,

    pub trial_start: Option<i64>,
    pub trial_end: Option<i64>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default)]
    pub items: StripeSubscriptionItems,

    /// Legacy single-plan field.
    pub plan: Option<StripePlan>,
}

/// Subscription items container.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

/// Single subscription item.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: Option<StripePrice>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
}

/// Stripe Price object (embedded in subscription items).
#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    /// Price ID.
    pub id: String,
}

/// Legacy Stripe Plan object.
#[derive(Debug, Clone, Deserialize)]
pub struct StripePlan {
    pub id: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Domain Mapping
// ════════════════════════════════════════════════════════════════════════════════

impl StripeSubscription {
    fn price_id(&self) -> Option<String> {
        self.items
            .data
            .first()
            .and_then(|item| item.price.as_ref())
            .map(|price| price.id.clone())
            .or_else(|| self.plan.as_ref().map(|plan| plan.id.clone()))
    }

    fn period(&self) -> Option<(i64, i64)> {
        let item = self.items.data.first();
        let start = self
            .current_period_start
            .or_else(|| item.and_then(|i| i.current_period_start))?;
        let end = self
            .current_period_end
            .or_else(|| item.and_then(|i| i.current_period_end))?;
        Some((start, end))
    }

    /// Maps onto the domain shape. Errors describe the offending field.
    pub fn into_domain(self) -> Result<SubscriptionObject, String> {
        let status = SubscriptionStatus::parse(&self.status)
            .ok_or_else(|| format!("unknown subscription status '{}'", self.status))?;
        let (start, end) = self
            .period()
            .ok_or_else(|| format!("subscription {} has no current period", self.id))?;

        Ok(SubscriptionObject {
            price_id: self.price_id(),
            current_period_start: timestamp(start, "current_period_start")?,
            current_period_end: timestamp(end, "current_period_end")?,
            trial_start: self
                .trial_start
                .map(|t| timestamp(t, "trial_start"))
                .transpose()?,
            trial_end: self
                .trial_end
                .map(|t| timestamp(t, "trial_end"))
                .transpose()?,
            user_id: self
                .metadata
                .get("user_id")
                .filter(|id| !id.trim().is_empty())
                .cloned(),
            id: self.id,
            customer: self.customer,
            status,
        })
    }
}

impl From<StripeCheckoutSession> for CheckoutSessionObject {
    fn from(session: StripeCheckoutSession) -> Self {
        Self {
            id: session.id,
            customer: session.customer,
            subscription: session.subscription,
            mode: session.mode,
            payment_status: session.payment_status,
        }
    }
}

impl StripeWebhookEvent {
    /// Decodes `data.object` according to the event type.
    pub fn into_verified(self) -> Result<VerifiedEvent, String> {
        let created = timestamp(self.created, "created")?;
        let object = self.data.object;

        let kind = match self.event_type.as_str() {
            ProviderEvent::SUBSCRIPTION_CREATED => {
                ProviderEvent::SubscriptionCreated(decode_subscription(object)?)
            }
            ProviderEvent::SUBSCRIPTION_UPDATED => {
                ProviderEvent::SubscriptionUpdated(decode_subscription(object)?)
            }
            ProviderEvent::SUBSCRIPTION_DELETED => {
                ProviderEvent::SubscriptionDeleted(decode_subscription(object)?)
            }
            ProviderEvent::CHECKOUT_SESSION_COMPLETED => {
                let session: StripeCheckoutSession = serde_json::from_value(object)
                    .map_err(|e| format!("invalid checkout session: {}", e))?;
                ProviderEvent::CheckoutSessionCompleted(session.into())
            }
            _ => ProviderEvent::Unknown {
                event_type: self.event_type.clone(),
                payload: object,
            },
        };

        Ok(VerifiedEvent {
            id: self.id,
            created,
            livemode: self.livemode,
            kind,
        })
    }
}

fn decode_subscription(object: serde_json::Value) -> Result<SubscriptionObject, String> {
    let subscription: StripeSubscription =
        serde_json::from_value(object).map_err(|e| format!("invalid subscription: {}", e))?;
    subscription.into_domain()
}

fn timestamp(secs: i64, field: &str) -> Result<Timestamp, String> {
    Timestamp::from_unix_secs(secs).map_err(|e| format!("{}: {}", field, e))
}
