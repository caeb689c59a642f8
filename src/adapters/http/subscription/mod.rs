//! HTTP adapter for subscription endpoints.
//!
//! Exposes the provider webhook receiver and the access gate.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    EntitlementResponse, ErrorResponse, HealthResponse, SyncAccessResponse,
    WebhookReceivedResponse,
};
pub use handlers::{
    check_access, handle_webhook, health, sync_access, AccessApiError, SubscriptionAppState,
    WebhookApiError, SIGNATURE_HEADER,
};
pub use routes::subscription_router;
