//! Verified provider events, decoded into the shapes the reconciler needs.
//!
//! Only fields relevant to reconciliation are captured. Anything the
//! reconciler does not act on is carried as [`ProviderEvent::Unknown`].

use serde::Serialize;

use crate::domain::foundation::Timestamp;

use super::SubscriptionStatus;

/// An event whose signature has been checked and whose body decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedEvent {
    /// Provider event identifier (`evt_…`).
    pub id: String,

    /// When the provider created the event.
    pub created: Timestamp,

    /// Live mode vs test mode.
    pub livemode: bool,

    pub kind: ProviderEvent,
}

impl VerifiedEvent {
    /// Provider event type string, e.g. `customer.subscription.updated`.
    pub fn event_type(&self) -> &str {
        self.kind.event_type()
    }
}

/// Tagged union over the event types this service distinguishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "object")]
pub enum ProviderEvent {
    SubscriptionCreated(SubscriptionObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    CheckoutSessionCompleted(CheckoutSessionObject),
    Unknown {
        event_type: String,
        payload: serde_json::Value,
    },
}

impl ProviderEvent {
    pub const SUBSCRIPTION_CREATED: &'static str = "customer.subscription.created";
    pub const SUBSCRIPTION_UPDATED: &'static str = "customer.subscription.updated";
    pub const SUBSCRIPTION_DELETED: &'static str = "customer.subscription.deleted";
    pub const CHECKOUT_SESSION_COMPLETED: &'static str = "checkout.session.completed";

    /// Returns the provider's wire name for this event.
    pub fn event_type(&self) -> &str {
        match self {
            Self::SubscriptionCreated(_) => Self::SUBSCRIPTION_CREATED,
            Self::SubscriptionUpdated(_) => Self::SUBSCRIPTION_UPDATED,
            Self::SubscriptionDeleted(_) => Self::SUBSCRIPTION_DELETED,
            Self::CheckoutSessionCompleted(_) => Self::CHECKOUT_SESSION_COMPLETED,
            Self::Unknown { event_type, .. } => event_type,
        }
    }

    /// The subscription object carried by subscription lifecycle events.
    pub fn subscription(&self) -> Option<&SubscriptionObject> {
        match self {
            Self::SubscriptionCreated(obj)
            | Self::SubscriptionUpdated(obj)
            | Self::SubscriptionDeleted(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Provider subscription object as the reconciler sees it.
///
/// Period boundaries are not yet validated against each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionObject {
    /// `sub_…`
    pub id: String,

    /// `cus_…`
    pub customer: String,

    pub status: SubscriptionStatus,

    /// `price_…` of the first subscription item, when present.
    pub price_id: Option<String>,

    pub current_period_start: Timestamp,
    pub current_period_end: Timestamp,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,

    /// `metadata.user_id`, set by the checkout flow.
    pub user_id: Option<String>,
}

/// Completed checkout session. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSessionObject {
    /// `cs_…`
    pub id: String,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub mode: Option<String>,
    pub payment_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> SubscriptionObject {
        SubscriptionObject {
            id: "sub_1".to_string(),
            customer: "cus_1".to_string(),
            status: SubscriptionStatus::Active,
            price_id: Some("price_1".to_string()),
            current_period_start: Timestamp::from_unix_secs(1_700_000_000).unwrap(),
            current_period_end: Timestamp::from_unix_secs(1_702_592_000).unwrap(),
            trial_start: None,
            trial_end: None,
            user_id: Some("user-1".to_string()),
        }
    }

    #[test]
    fn event_type_matches_wire_names() {
        assert_eq!(
            ProviderEvent::SubscriptionCreated(object()).event_type(),
            "customer.subscription.created"
        );
        assert_eq!(
            ProviderEvent::SubscriptionDeleted(object()).event_type(),
            "customer.subscription.deleted"
        );
        let unknown = ProviderEvent::Unknown {
            event_type: "invoice.paid".to_string(),
            payload: serde_json::json!({}),
        };
        assert_eq!(unknown.event_type(), "invoice.paid");
    }

    #[test]
    fn subscription_is_only_present_on_lifecycle_events() {
        assert!(ProviderEvent::SubscriptionUpdated(object()).subscription().is_some());

        let checkout = ProviderEvent::CheckoutSessionCompleted(CheckoutSessionObject {
            id: "cs_1".to_string(),
            customer: None,
            subscription: None,
            mode: None,
            payment_status: None,
        });
        assert!(checkout.subscription().is_none());
    }
}
