//! Subscription repository port.
//!
//! Defines the contract for persisting the local mirror of provider
//! subscriptions.
//!
//! # Design
//!
//! - **Natural key**: `provider_subscription_id` identifies at most one row
//! - **Atomic upsert**: insert-or-update happens in one operation, never as
//!   read-then-write
//! - **No hard deletes**: cancellation is a status value

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionChanges};
use async_trait::async_trait;

/// Result of an atomic upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed for the provider id; one was created.
    Inserted(Subscription),
    /// The existing row's mutable fields were overwritten.
    Updated(Subscription),
}

impl UpsertOutcome {
    pub fn subscription(&self) -> &Subscription {
        match self {
            UpsertOutcome::Inserted(s) | UpsertOutcome::Updated(s) => s,
        }
    }

    pub fn into_subscription(self) -> Subscription {
        match self {
            UpsertOutcome::Inserted(s) | UpsertOutcome::Updated(s) => s,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, UpsertOutcome::Inserted(_))
    }
}

/// Repository port for subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by the provider's subscription id.
    ///
    /// Returns `None` if not found.
    async fn find_by_provider_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Insert a new subscription.
    ///
    /// # Errors
    ///
    /// - `SubscriptionExists` if the provider id is already stored
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, fields: &NewSubscription) -> Result<Subscription, DomainError>;

    /// Apply mutable fields to the row with the given provider id.
    ///
    /// Returns `None` when no such row exists.
    async fn update(
        &self,
        provider_subscription_id: &str,
        changes: &SubscriptionChanges,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Insert, or on provider-id conflict apply [`NewSubscription::changes`],
    /// as a single atomic operation.
    async fn upsert(&self, fields: &NewSubscription) -> Result<UpsertOutcome, DomainError>;

    /// The subscription that governs the user's access.
    ///
    /// Ranked by [`Subscription::precedence`]: access-granting status first,
    /// then latest period end, then latest creation. Never by write time.
    async fn find_current_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError>;
}
