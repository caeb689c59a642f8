//! Event reconciler port.
//!
//! Applies a verified provider event to the local subscription store.

use crate::domain::foundation::UserId;
use crate::domain::subscription::{Subscription, VerifiedEvent, WebhookError};
use async_trait::async_trait;

/// What reconciling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A new row was created.
    Inserted(Subscription),
    /// An existing row was overwritten.
    Updated(Subscription),
    /// An existing row was moved to a terminal status.
    Canceled(Subscription),
    /// A deletion arrived for a subscription never stored.
    NotFound { provider_subscription_id: String },
    /// Informational event; nothing stored.
    Acknowledged,
    /// Event type not handled.
    Ignored { event_type: String },
}

impl ReconcileOutcome {
    /// The user whose entitlement may have changed, if any.
    pub fn affected_user(&self) -> Option<&UserId> {
        match self {
            ReconcileOutcome::Inserted(s)
            | ReconcileOutcome::Updated(s)
            | ReconcileOutcome::Canceled(s) => Some(&s.user_id),
            _ => None,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Inserted(_) => "inserted",
            ReconcileOutcome::Updated(_) => "updated",
            ReconcileOutcome::Canceled(_) => "canceled",
            ReconcileOutcome::NotFound { .. } => "not_found",
            ReconcileOutcome::Acknowledged => "acknowledged",
            ReconcileOutcome::Ignored { .. } => "ignored",
        }
    }
}

/// Port for applying verified events.
#[async_trait]
pub trait EventReconciler: Send + Sync {
    /// # Errors
    ///
    /// - `MalformedEvent` if the event cannot be reconciled
    /// - `Persistence` if the store fails
    async fn reconcile(&self, event: &VerifiedEvent) -> Result<ReconcileOutcome, WebhookError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_reconciler_is_object_safe() {
        fn _accepts_dyn(_reconciler: &dyn EventReconciler) {}
    }

    #[test]
    fn non_mutating_outcomes_have_no_affected_user() {
        assert!(ReconcileOutcome::Acknowledged.affected_user().is_none());
        assert!(ReconcileOutcome::Ignored {
            event_type: "invoice.paid".to_string()
        }
        .affected_user()
        .is_none());
        assert!(ReconcileOutcome::NotFound {
            provider_subscription_id: "sub_x".to_string()
        }
        .affected_user()
        .is_none());
    }
}
