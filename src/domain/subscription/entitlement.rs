//! Pure status-to-entitlement rule used by the access gate.
//!
//! A user is entitled iff their current subscription is `active` or
//! `trialing` and its current period has not ended.

use serde::Serialize;

use crate::domain::foundation::{Timestamp, UserId};

use super::{Subscription, SubscriptionStatus};

/// Why a user is or is not entitled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "status", rename_all = "snake_case")]
pub enum EntitlementReason {
    Active,
    Trialing,
    NoSubscription,
    StatusNotEntitled(SubscriptionStatus),
    PeriodEnded,
}

/// Entitlement decision for one user at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entitlement {
    pub user_id: UserId,
    pub entitled: bool,
    pub status: Option<SubscriptionStatus>,
    pub end_date: Option<Timestamp>,
    pub reason: EntitlementReason,
}

impl Entitlement {
    /// Evaluates the rule against the user's current subscription, if any.
    pub fn evaluate(user_id: UserId, current: Option<&Subscription>, now: Timestamp) -> Self {
        let Some(subscription) = current else {
            return Self {
                user_id,
                entitled: false,
                status: None,
                end_date: None,
                reason: EntitlementReason::NoSubscription,
            };
        };

        let reason = reason_for(subscription.status, subscription.end_date, now);
        Self {
            user_id,
            entitled: matches!(reason, EntitlementReason::Active | EntitlementReason::Trialing),
            status: Some(subscription.status),
            end_date: Some(subscription.end_date),
            reason,
        }
    }
}

/// The bare predicate, kept separate so it can be checked exhaustively.
pub fn is_entitled(status: SubscriptionStatus, end_date: Timestamp, now: Timestamp) -> bool {
    status.grants_access() && end_date.is_after(&now)
}

fn reason_for(status: SubscriptionStatus, end_date: Timestamp, now: Timestamp) -> EntitlementReason {
    if !status.grants_access() {
        return EntitlementReason::StatusNotEntitled(status);
    }
    if !is_entitled(status, end_date, now) {
        return EntitlementReason::PeriodEnded;
    }
    match status {
        SubscriptionStatus::Trialing => EntitlementReason::Trialing,
        _ => EntitlementReason::Active,
    }
}
