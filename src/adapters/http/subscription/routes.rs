//! Axum router configuration for subscription endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{check_access, handle_webhook, health, sync_access, SubscriptionAppState};

/// Create the subscription API router.
///
/// # Routes
/// - `POST /api/webhook` - Provider webhook (signature verified, no auth)
/// - `GET /api/access/:user_id` - Entitlement check (bearer token)
/// - `POST /api/access/:user_id/sync` - Push entitlement to grantees (bearer token)
/// - `GET /health` - Liveness
pub fn subscription_router() -> Router<SubscriptionAppState> {
    Router::new()
        .route("/api/webhook", post(handle_webhook))
        .route("/api/access/:user_id", get(check_access))
        .route("/api/access/:user_id/sync", post(sync_access))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySubscriptionRepository;
    use crate::adapters::stripe::{compute_test_signature, StripeWebhookVerifier};
    use crate::domain::foundation::{DomainError, UserId};
    use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionChanges};
    use crate::ports::{SubscriptionRepository, UpsertOutcome};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "whsec_route_test";

    // ───────────────────────────────────────────────────────────────
    // Fixtures
    // ───────────────────────────────────────────────────────────────

    struct DownRepository;

    #[async_trait]
    impl SubscriptionRepository for DownRepository {
        async fn find_by_provider_id(&self, _: &str) -> Result<Option<Subscription>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn insert(&self, _: &NewSubscription) -> Result<Subscription, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn update(
            &self,
            _: &str,
            _: &SubscriptionChanges,
        ) -> Result<Option<Subscription>, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn upsert(&self, _: &NewSubscription) -> Result<UpsertOutcome, DomainError> {
            Err(DomainError::database("down"))
        }
        async fn find_current_for_user(
            &self,
            _: &UserId,
        ) -> Result<Option<Subscription>, DomainError> {
            Err(DomainError::database("down"))
        }
    }

    fn app(repo: Arc<dyn SubscriptionRepository>) -> Router {
        let verifier = Arc::new(StripeWebhookVerifier::new(SecretString::new(
            SECRET.to_string(),
        )));
        subscription_router().with_state(SubscriptionAppState::new(repo, verifier))
    }

    fn subscription_event(id: &str, status: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        serde_json::json!({
            "id": "evt_route",
            "type": "customer.subscription.updated",
            "created": now,
            "livemode": false,
            "data": { "object": {
                "id": id,
                "customer": "cus_1",
                "status": status,
                "current_period_start": now - 86_400,
                "current_period_end": now + 86_400 * 29,
                "metadata": { "user_id": "user-1" },
                "items": { "data": [ { "price": { "id": "price_1" } } ] }
            } }
        })
        .to_string()
    }

    fn webhook_request(body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/api/webhook");
        if let Some(sig) = signature {
            builder = builder.header("Stripe-Signature", sig);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed(body: &str) -> Option<String> {
        Some(compute_test_signature(
            SECRET,
            chrono::Utc::now().timestamp(),
            body,
        ))
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // Tests
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn signed_webhook_is_acknowledged_and_stored() {
        let repo = InMemorySubscriptionRepository::new();
        let body = subscription_event("sub_1", "active");

        let response = app(Arc::new(repo.clone()))
            .oneshot(webhook_request(&body, signed(&body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"received":true}"#);
        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn missing_signature_is_plain_text_400() {
        let repo = InMemorySubscriptionRepository::new();
        let body = subscription_event("sub_1", "active");

        let response = app(Arc::new(repo.clone()))
            .oneshot(webhook_request(&body, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_string(response).await,
            "Webhook Error: No signature provided"
        );
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn bad_signature_is_400_and_store_untouched() {
        let repo = InMemorySubscriptionRepository::new();
        let body = subscription_event("sub_1", "active");
        let forged = Some(compute_test_signature(
            "whsec_forged",
            chrono::Utc::now().timestamp(),
            &body,
        ));

        let response = app(Arc::new(repo.clone()))
            .oneshot(webhook_request(&body, forged))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn store_failure_is_500() {
        let body = subscription_event("sub_1", "active");

        let response = app(Arc::new(DownRepository))
            .oneshot(webhook_request(&body, signed(&body)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.starts_with("Webhook Error:"));
    }

    #[tokio::test]
    async fn access_reflects_reconciled_state() {
        let repo = InMemorySubscriptionRepository::new();
        let router = app(Arc::new(repo.clone()));
        let body = subscription_event("sub_1", "trialing");
        router
            .clone()
            .oneshot(webhook_request(&body, signed(&body)))
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/access/user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["entitled"], true);
        assert_eq!(json["status"], "trialing");
        assert_eq!(json["reason"], "trialing");
    }

    #[tokio::test]
    async fn access_store_failure_is_500_json() {
        let response = app(Arc::new(DownRepository))
            .oneshot(
                Request::builder()
                    .uri("/api/access/user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error_code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn sync_without_grantees_reports_revoke() {
        let response = app(Arc::new(InMemorySubscriptionRepository::new()))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/access/user-9/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["action"], "revoke");
        assert_eq!(json["failures"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn access_routes_require_configured_token() {
        let verifier = Arc::new(StripeWebhookVerifier::new(SecretString::new(
            SECRET.to_string(),
        )));
        let state =
            SubscriptionAppState::new(Arc::new(InMemorySubscriptionRepository::new()), verifier)
                .with_access_token(SecretString::new("internal-token".to_string()));
        let router = subscription_router().with_state(state);

        let anonymous = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/access/user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let forged_sync = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/access/user-1/sync")
                    .header("Authorization", "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(forged_sync.status(), StatusCode::UNAUTHORIZED);

        let authorized = router
            .oneshot(
                Request::builder()
                    .uri("/api/access/user-1")
                    .header("Authorization", "Bearer internal-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(authorized.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app(Arc::new(InMemorySubscriptionRepository::new()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
    }
}
