//! Provider-defined subscription lifecycle states.
//!
//! The set mirrors Stripe's subscription statuses exactly. Transitions are
//! driven by the provider; this module only names the states and answers
//! questions about them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription status as reported by the billing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and current.
    Active,

    /// In a free trial period.
    Trialing,

    /// Latest renewal payment failed; provider is retrying.
    PastDue,

    /// Canceled. Terminal.
    Canceled,

    /// First payment has not succeeded yet.
    Incomplete,

    /// First payment never succeeded within the provider's window. Terminal.
    IncompleteExpired,

    /// Retries exhausted without payment.
    Unpaid,

    /// Trial ended without a payment method; collection paused.
    Paused,
}

impl SubscriptionStatus {
    /// All statuses, in provider documentation order.
    pub const ALL: [SubscriptionStatus; 8] = [
        SubscriptionStatus::Active,
        SubscriptionStatus::Trialing,
        SubscriptionStatus::PastDue,
        SubscriptionStatus::Canceled,
        SubscriptionStatus::Incomplete,
        SubscriptionStatus::IncompleteExpired,
        SubscriptionStatus::Unpaid,
        SubscriptionStatus::Paused,
    ];

    /// Parses the provider's wire representation.
    ///
    /// Returns `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "trialing" => Some(Self::Trialing),
            "past_due" => Some(Self::PastDue),
            "canceled" => Some(Self::Canceled),
            "incomplete" => Some(Self::Incomplete),
            "incomplete_expired" => Some(Self::IncompleteExpired),
            "unpaid" => Some(Self::Unpaid),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }

    /// Returns the provider's wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
        }
    }

    /// Returns true if the provider will never move the subscription out of
    /// this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::IncompleteExpired)
    }

    /// Returns true if this status, on its own, entitles the owner to
    /// gated features. Period end is checked separately.
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
