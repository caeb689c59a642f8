//! Subscription entity and the field sets used to create and mutate it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId, ValidationError};

use super::SubscriptionStatus;

/// Current billing period boundaries.
///
/// Construction enforces `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    start: Timestamp,
    end: Timestamp,
}

impl BillingPeriod {
    /// Creates a period, rejecting an end before the start.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if end.is_before(&start) {
            return Err(ValidationError::out_of_order("end_date", "start_date"));
        }
        Ok(Self { start, end })
    }

    /// Creates a period from provider epoch seconds.
    pub fn from_unix_secs(start: i64, end: i64) -> Result<Self, ValidationError> {
        Self::new(Timestamp::from_unix_secs(start)?, Timestamp::from_unix_secs(end)?)
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }
}

/// Persisted subscription row.
///
/// Mirrors a provider subscription. `provider_subscription_id` is the
/// natural key; `id` is local and never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub provider_customer_id: String,
    pub provider_subscription_id: String,
    pub status: SubscriptionStatus,
    pub price_id: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Materializes a new row from reconciled provider fields.
    pub fn create(id: SubscriptionId, fields: &NewSubscription, now: Timestamp) -> Self {
        Self {
            id,
            user_id: fields.user_id.clone(),
            provider_customer_id: fields.provider_customer_id.clone(),
            provider_subscription_id: fields.provider_subscription_id.clone(),
            status: fields.status,
            price_id: fields.price_id.clone(),
            start_date: fields.period.start(),
            end_date: fields.period.end(),
            trial_start: fields.trial_start,
            trial_end: fields.trial_end,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies mutable fields. Identifiers and `created_at` are untouched.
    pub fn apply(&mut self, changes: &SubscriptionChanges, now: Timestamp) {
        self.status = changes.status;
        self.start_date = changes.period.start();
        self.end_date = changes.period.end();
        if let Some(price_id) = &changes.price_id {
            self.price_id = price_id.clone();
        }
        self.trial_start = changes.trial_start;
        self.trial_end = changes.trial_end;
        self.updated_at = now;
    }

    /// Ordering used to pick the row that governs a user's access.
    ///
    /// Access-granting statuses outrank the rest, then the later period
    /// end, then the later creation. Write time plays no part, so
    /// replaying an old event cannot promote a dead row.
    pub fn precedence(&self) -> (bool, Timestamp, Timestamp) {
        (self.status.grants_access(), self.end_date, self.created_at)
    }

    #[cfg(test)]
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// Everything needed to insert a subscription row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub provider_customer_id: String,
    pub provider_subscription_id: String,
    pub status: SubscriptionStatus,
    pub price_id: String,
    pub period: BillingPeriod,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
}

impl NewSubscription {
    /// The subset of fields an upsert may overwrite on an existing row.
    pub fn changes(&self) -> SubscriptionChanges {
        SubscriptionChanges {
            status: self.status,
            period: self.period,
            price_id: Some(self.price_id.clone()),
            trial_start: self.trial_start,
            trial_end: self.trial_end,
        }
    }
}

/// Mutable fields of a subscription row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChanges {
    pub status: SubscriptionStatus,
    pub period: BillingPeriod,
    /// `None` keeps the stored plan.
    pub price_id: Option<String>,
    pub trial_start: Option<Timestamp>,
    pub trial_end: Option<Timestamp>,
}
