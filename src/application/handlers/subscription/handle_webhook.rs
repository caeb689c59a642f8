//! HandleWebhookHandler - Command handler for provider webhook deliveries.
//!
//! Verify, then reconcile, then (best effort) sync access for the affected
//! user. Nothing is reconciled unless verification succeeded.

use std::sync::Arc;

use crate::application::handlers::subscription::{SyncAccessHandler, SyncAccessResult};
use crate::domain::subscription::WebhookError;
use crate::ports::{EventReconciler, ReconcileOutcome, WebhookVerifier};

/// Command to handle a webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header, if sent.
    pub signature: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone)]
pub struct HandleWebhookResult {
    pub event_id: String,
    pub event_type: String,
    pub outcome: ReconcileOutcome,
    /// Present when a row changed and grantee sync ran.
    pub sync: Option<SyncAccessResult>,
}

pub struct HandleWebhookHandler {
    verifier: Arc<dyn WebhookVerifier>,
    reconciler: Arc<dyn EventReconciler>,
    sync: Option<Arc<SyncAccessHandler>>,
}

impl HandleWebhookHandler {
    pub fn new(verifier: Arc<dyn WebhookVerifier>, reconciler: Arc<dyn EventReconciler>) -> Self {
        Self {
            verifier,
            reconciler,
            sync: None,
        }
    }

    /// Enables grantee sync after row-changing events.
    pub fn with_access_sync(mut self, sync: Arc<SyncAccessHandler>) -> Self {
        self.sync = Some(sync);
        self
    }

    pub async fn handle(
        &self,
        cmd: HandleWebhookCommand,
    ) -> Result<HandleWebhookResult, WebhookError> {
        // 1. Verify signature and decode
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, cmd.signature.as_deref())?;

        // 2. Reconcile
        let outcome = self.reconciler.reconcile(&event).await?;

        // 3. Sync access; failures never fail the delivery
        let sync = match (&self.sync, outcome.affected_user()) {
            (Some(sync), Some(user_id)) => match sync.sync(user_id).await {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(
                        event_id = %event.id,
                        user_id = %user_id,
                        error = %e,
                        "Access sync skipped"
                    );
                    None
                }
            },
            _ => None,
        };

        Ok(HandleWebhookResult {
            event_id: event.id.clone(),
            event_type: event.event_type().to_string(),
            outcome,
            sync,
        })
    }
}
