//! AccessGate - Query handler answering "is this user entitled right now".
//!
//! Fail-secure: a store failure is returned as an error, and callers must
//! treat an error as "not entitled".

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::Entitlement;
use crate::ports::SubscriptionRepository;

/// Reads the user's current subscription and applies the entitlement rule.
pub struct AccessGate {
    repository: Arc<dyn SubscriptionRepository>,
}

impl AccessGate {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    pub async fn check(&self, user_id: &UserId, now: Timestamp) -> Result<Entitlement, DomainError> {
        let current = self.repository.find_current_for_user(user_id).await?;
        let entitlement = Entitlement::evaluate(user_id.clone(), current.as_ref(), now);

        tracing::debug!(
            user_id = %user_id,
            entitled = entitlement.entitled,
            reason = ?entitlement.reason,
            "Entitlement checked"
        );
        Ok(entitlement)
    }
}
