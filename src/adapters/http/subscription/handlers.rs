//! HTTP handlers for subscription endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use secrecy::SecretString;

use crate::application::handlers::subscription::{
    AccessGate, HandleWebhookCommand, HandleWebhookHandler, SubscriptionReconciler,
    SyncAccessHandler,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::WebhookError;
use crate::ports::{AccessGrantee, SubscriptionRepository, WebhookVerifier};

use crate::adapters::http::middleware::RequireAccessToken;

use super::dto::{
    EntitlementResponse, ErrorResponse, HealthResponse, SyncAccessResponse,
    WebhookReceivedResponse,
};

/// Header carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is Arc-wrapped.
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub repository: Arc<dyn SubscriptionRepository>,
    pub verifier: Arc<dyn WebhookVerifier>,
    pub grantees: Vec<Arc<dyn AccessGrantee>>,
    /// Bearer token for the access endpoints; `None` leaves them open.
    pub access_token: Option<SecretString>,
}

impl SubscriptionAppState {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        verifier: Arc<dyn WebhookVerifier>,
    ) -> Self {
        Self {
            repository,
            verifier,
            grantees: Vec::new(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    pub fn with_grantee(mut self, grantee: Arc<dyn AccessGrantee>) -> Self {
        self.grantees.push(grantee);
        self
    }

    pub fn access_gate(&self) -> AccessGate {
        AccessGate::new(self.repository.clone())
    }

    pub fn sync_access_handler(&self) -> SyncAccessHandler {
        SyncAccessHandler::new(Arc::new(self.access_gate()), self.grantees.clone())
    }

    pub fn webhook_handler(&self) -> HandleWebhookHandler {
        let reconciler = Arc::new(SubscriptionReconciler::new(self.repository.clone()));
        let handler = HandleWebhookHandler::new(self.verifier.clone(), reconciler);
        if self.grantees.is_empty() {
            handler
        } else {
            handler.with_access_sync(Arc::new(self.sync_access_handler()))
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhook
///
/// The body is taken as raw bytes so the signature covers exactly what
/// the provider sent.
pub async fn handle_webhook(
    State(state): State<SubscriptionAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleWebhookCommand {
        payload: body.to_vec(),
        signature,
    };
    let result = state.webhook_handler().handle(cmd).await?;

    tracing::debug!(
        event_id = %result.event_id,
        event_type = %result.event_type,
        outcome = result.outcome.label(),
        "Webhook processed"
    );
    Ok((StatusCode::OK, Json(WebhookReceivedResponse::ok())))
}

/// GET /api/access/:user_id
///
/// Requires the access token when one is configured.
pub async fn check_access(
    _: RequireAccessToken,
    State(state): State<SubscriptionAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AccessApiError> {
    let user_id = UserId::new(user_id).map_err(DomainError::from)?;
    let entitlement = state.access_gate().check(&user_id, Timestamp::now()).await?;

    Ok(Json(EntitlementResponse::from(&entitlement)))
}

/// POST /api/access/:user_id/sync
pub async fn sync_access(
    _: RequireAccessToken,
    State(state): State<SubscriptionAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AccessApiError> {
    let user_id = UserId::new(user_id).map_err(DomainError::from)?;
    let result = state.sync_access_handler().sync(&user_id).await?;

    Ok(Json(SyncAccessResponse::from(result)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Webhook failures as plain-text responses.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, retryable = self.0.is_retryable(), "Webhook failed");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            format!("Webhook Error: {}", self.0),
        )
            .into_response()
    }
}

/// Access endpoint failures as JSON responses.
pub struct AccessApiError(DomainError);

impl From<DomainError> for AccessApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AccessApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::SubscriptionNotFound => StatusCode::NOT_FOUND,
            ErrorCode::SubscriptionExists => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                tracing::error!(error = %self.0, "Access check failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse::new(self.0.code.to_string(), self.0.message);
        (status, Json(body)).into_response()
    }
}
