//! SubscriptionReconciler - Applies verified provider events to the local store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::domain::subscription::{
    BillingPeriod, CheckoutSessionObject, NewSubscription, ProviderEvent, SubscriptionChanges,
    SubscriptionObject, SubscriptionStatus, VerifiedEvent, WebhookError,
};
use crate::ports::{EventReconciler, ReconcileOutcome, SubscriptionRepository, UpsertOutcome};

/// Reconciles provider subscription events into the subscription store.
///
/// Every write is a single repository call keyed on the provider
/// subscription id, so redelivered or concurrent events converge.
pub struct SubscriptionReconciler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionReconciler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    async fn handle_upsert(
        &self,
        event: &VerifiedEvent,
        obj: &SubscriptionObject,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let period = period_of(event, obj)?;

        let Some(user_id) = owner_of(obj) else {
            return self.refresh_existing(event, obj, period).await;
        };
        let Some(price_id) = obj.price_id.clone() else {
            return self.refresh_existing(event, obj, period).await;
        };

        let fields = NewSubscription {
            user_id,
            provider_customer_id: obj.customer.clone(),
            provider_subscription_id: obj.id.clone(),
            status: obj.status,
            price_id,
            period,
            trial_start: obj.trial_start,
            trial_end: obj.trial_end,
        };

        let outcome = self
            .repository
            .upsert(&fields)
            .await
            .map_err(|e| persistence_failure(event, &obj.id, e.into()))?;

        let (label, subscription) = match outcome {
            UpsertOutcome::Inserted(s) => ("inserted", ReconcileOutcome::Inserted(s)),
            UpsertOutcome::Updated(s) => ("updated", ReconcileOutcome::Updated(s)),
        };
        tracing::info!(
            event_id = %event.id,
            event_type = event.event_type(),
            provider_subscription_id = %obj.id,
            status = %obj.status,
            outcome = label,
            "Subscription reconciled"
        );
        Ok(subscription)
    }

    /// Without an owner or price a row cannot be created, only refreshed.
    async fn refresh_existing(
        &self,
        event: &VerifiedEvent,
        obj: &SubscriptionObject,
        period: BillingPeriod,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let changes = SubscriptionChanges {
            status: obj.status,
            period,
            price_id: obj.price_id.clone(),
            trial_start: obj.trial_start,
            trial_end: obj.trial_end,
        };

        match self
            .repository
            .update(&obj.id, &changes)
            .await
            .map_err(|e| persistence_failure(event, &obj.id, e.into()))?
        {
            Some(subscription) => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = event.event_type(),
                    provider_subscription_id = %obj.id,
                    status = %obj.status,
                    outcome = "updated",
                    "Subscription reconciled"
                );
                Ok(ReconcileOutcome::Updated(subscription))
            }
            None => {
                let reason = if owner_of(obj).is_none() {
                    "missing metadata.user_id"
                } else {
                    "missing price id"
                };
                Err(malformed(
                    event,
                    format!("subscription {} is not stored and has {}", obj.id, reason),
                ))
            }
        }
    }

    async fn handle_deleted(
        &self,
        event: &VerifiedEvent,
        obj: &SubscriptionObject,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let period = period_of(event, obj)?;
        let status = if obj.status.is_terminal() {
            obj.status
        } else {
            SubscriptionStatus::Canceled
        };

        let changes = SubscriptionChanges {
            status,
            period,
            price_id: None,
            trial_start: obj.trial_start,
            trial_end: obj.trial_end,
        };

        match self
            .repository
            .update(&obj.id, &changes)
            .await
            .map_err(|e| persistence_failure(event, &obj.id, e.into()))?
        {
            Some(subscription) => {
                tracing::info!(
                    event_id = %event.id,
                    provider_subscription_id = %obj.id,
                    user_id = %subscription.user_id,
                    status = %status,
                    "Subscription canceled"
                );
                Ok(ReconcileOutcome::Canceled(subscription))
            }
            None => {
                tracing::warn!(
                    event_id = %event.id,
                    provider_subscription_id = %obj.id,
                    "Deletion received for unknown subscription"
                );
                Ok(ReconcileOutcome::NotFound {
                    provider_subscription_id: obj.id.clone(),
                })
            }
        }
    }

    fn handle_checkout_completed(
        &self,
        event: &VerifiedEvent,
        session: &CheckoutSessionObject,
    ) -> ReconcileOutcome {
        tracing::info!(
            event_id = %event.id,
            session_id = %session.id,
            customer = session.customer.as_deref().unwrap_or("-"),
            provider_subscription_id = session.subscription.as_deref().unwrap_or("-"),
            "Checkout session completed"
        );
        ReconcileOutcome::Acknowledged
    }
}

#[async_trait]
impl EventReconciler for SubscriptionReconciler {
    async fn reconcile(&self, event: &VerifiedEvent) -> Result<ReconcileOutcome, WebhookError> {
        match &event.kind {
            ProviderEvent::SubscriptionCreated(obj) | ProviderEvent::SubscriptionUpdated(obj) => {
                self.handle_upsert(event, obj).await
            }
            ProviderEvent::SubscriptionDeleted(obj) => self.handle_deleted(event, obj).await,
            ProviderEvent::CheckoutSessionCompleted(session) => {
                Ok(self.handle_checkout_completed(event, session))
            }
            ProviderEvent::Unknown { event_type, .. } => {
                tracing::debug!(event_id = %event.id, event_type = %event_type, "Ignoring event");
                Ok(ReconcileOutcome::Ignored {
                    event_type: event_type.clone(),
                })
            }
        }
    }
}

fn owner_of(obj: &SubscriptionObject) -> Option<UserId> {
    obj.user_id.as_deref().and_then(|id| UserId::new(id).ok())
}

fn period_of(
    event: &VerifiedEvent,
    obj: &SubscriptionObject,
) -> Result<BillingPeriod, WebhookError> {
    BillingPeriod::new(obj.current_period_start, obj.current_period_end)
        .map_err(|e| malformed(event, format!("subscription {}: {}", obj.id, e)))
}

fn malformed(event: &VerifiedEvent, reason: String) -> WebhookError {
    tracing::error!(
        event_id = %event.id,
        event_type = event.event_type(),
        reason = %reason,
        "Malformed event"
    );
    WebhookError::MalformedEvent(reason)
}

fn persistence_failure(
    event: &VerifiedEvent,
    provider_subscription_id: &str,
    err: WebhookError,
) -> WebhookError {
    tracing::error!(
        event_id = %event.id,
        provider_subscription_id = %provider_subscription_id,
        error = %err,
        "Subscription store failed"
    );
    err
}
