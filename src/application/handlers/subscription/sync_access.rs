//! SyncAccessHandler - Pushes a user's entitlement to every grantee.

use std::sync::Arc;

use serde::Serialize;

use crate::application::handlers::subscription::AccessGate;
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::Entitlement;
use crate::ports::AccessGrantee;

/// Which side effect was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    Grant,
    Revoke,
}

/// One grantee that failed to apply the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GranteeFailure {
    pub grantee: String,
    pub error: String,
}

/// Result of a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncAccessResult {
    pub entitlement: Entitlement,
    pub action: AccessAction,
    pub failures: Vec<GranteeFailure>,
}

/// Computes entitlement, then grants or revokes on every grantee.
///
/// Grantee failures are collected, not propagated. Only a store failure
/// while computing entitlement is an error.
pub struct SyncAccessHandler {
    gate: Arc<AccessGate>,
    grantees: Vec<Arc<dyn AccessGrantee>>,
}

impl SyncAccessHandler {
    pub fn new(gate: Arc<AccessGate>, grantees: Vec<Arc<dyn AccessGrantee>>) -> Self {
        Self { gate, grantees }
    }

    pub async fn sync(&self, user_id: &UserId) -> Result<SyncAccessResult, DomainError> {
        let entitlement = self.gate.check(user_id, Timestamp::now()).await?;
        let action = if entitlement.entitled {
            AccessAction::Grant
        } else {
            AccessAction::Revoke
        };

        let mut failures = Vec::new();
        for grantee in &self.grantees {
            let result = match action {
                AccessAction::Grant => grantee.grant(user_id).await,
                AccessAction::Revoke => grantee.revoke(user_id).await,
            };
            if let Err(e) = result {
                tracing::warn!(
                    user_id = %user_id,
                    grantee = grantee.name(),
                    action = ?action,
                    error = %e,
                    "Access sync failed for grantee"
                );
                failures.push(GranteeFailure {
                    grantee: grantee.name().to_string(),
                    error: e.to_string(),
                });
            }
        }

        tracing::info!(
            user_id = %user_id,
            action = ?action,
            grantees = self.grantees.len(),
            failed = failures.len(),
            "Access synced"
        );

        Ok(SyncAccessResult {
            entitlement,
            action,
            failures,
        })
    }
}
