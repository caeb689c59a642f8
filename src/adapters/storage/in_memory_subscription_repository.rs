//! In-Memory Subscription Repository
//!
//! Stores subscriptions in memory, keyed by provider subscription id.
//! Useful for testing and local runs without Postgres.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionChanges};
use crate::ports::{SubscriptionRepository, UpsertOutcome};

/// In-memory subscription store.
///
/// Check-and-write always happens under a single write lock, so concurrent
/// upserts for one provider id never produce two rows.
#[derive(Debug, Clone)]
pub struct InMemorySubscriptionRepository {
    rows: Arc<RwLock<HashMap<String, Subscription>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored rows
    pub async fn count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Snapshot of all rows (useful for tests)
    pub async fn all(&self) -> Vec<Subscription> {
        self.rows.read().await.values().cloned().collect()
    }
}

impl Default for InMemorySubscriptionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_provider_id(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.read().await.get(provider_subscription_id).cloned())
    }

    async fn insert(&self, fields: &NewSubscription) -> Result<Subscription, DomainError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&fields.provider_subscription_id) {
            return Err(DomainError::new(
                ErrorCode::SubscriptionExists,
                "Subscription already exists",
            )
            .with_detail("provider_subscription_id", &fields.provider_subscription_id));
        }

        let subscription = Subscription::create(SubscriptionId::new(), fields, Timestamp::now());
        rows.insert(fields.provider_subscription_id.clone(), subscription.clone());
        Ok(subscription)
    }

    async fn update(
        &self,
        provider_subscription_id: &str,
        changes: &SubscriptionChanges,
    ) -> Result<Option<Subscription>, DomainError> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(provider_subscription_id).map(|row| {
            row.apply(changes, Timestamp::now());
            row.clone()
        }))
    }

    async fn upsert(&self, fields: &NewSubscription) -> Result<UpsertOutcome, DomainError> {
        let mut rows = self.rows.write().await;
        let now = Timestamp::now();

        if let Some(row) = rows.get_mut(&fields.provider_subscription_id) {
            row.apply(&fields.changes(), now);
            return Ok(UpsertOutcome::Updated(row.clone()));
        }

        let subscription = Subscription::create(SubscriptionId::new(), fields, now);
        rows.insert(fields.provider_subscription_id.clone(), subscription.clone());
        Ok(UpsertOutcome::Inserted(subscription))
    }

    async fn find_current_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|s| &s.user_id == user_id)
            .max_by_key(|s| s.precedence())
            .cloned())
    }
}
