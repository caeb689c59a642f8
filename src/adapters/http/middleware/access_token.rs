//! Shared-secret gate for the access endpoints.
//!
//! The access endpoints expose subscription status and trigger outbound
//! grant callbacks, so callers present the configured token:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! With no token configured the endpoints are open, which
//! `AppConfig::validate` refuses in production.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use crate::adapters::http::subscription::{ErrorResponse, SubscriptionAppState};

/// Extractor that admits the request only with the configured bearer token.
#[derive(Debug, Clone, Copy)]
pub struct RequireAccessToken;

#[axum::async_trait]
impl FromRequestParts<SubscriptionAppState> for RequireAccessToken {
    type Rejection = AccessTokenRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SubscriptionAppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.access_token else {
            return Ok(RequireAccessToken);
        };

        let presented = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or(AccessTokenRejection::Missing)?;

        let matches: bool = presented
            .as_bytes()
            .ct_eq(expected.expose_secret().as_bytes())
            .into();
        if !matches {
            tracing::warn!(path = %parts.uri.path(), "Access request with invalid token");
            return Err(AccessTokenRejection::Invalid);
        }
        Ok(RequireAccessToken)
    }
}

/// Rejection for the access token gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTokenRejection {
    Missing,
    Invalid,
}

impl IntoResponse for AccessTokenRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AccessTokenRejection::Missing => "Access token required",
            AccessTokenRejection::Invalid => "Invalid access token",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("UNAUTHORIZED", message)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemorySubscriptionRepository;
    use crate::adapters::stripe::StripeWebhookVerifier;
    use axum::http::Request;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn state(token: Option<&str>) -> SubscriptionAppState {
        let verifier = Arc::new(StripeWebhookVerifier::new(SecretString::new(
            "whsec_test".to_string(),
        )));
        let state =
            SubscriptionAppState::new(Arc::new(InMemorySubscriptionRepository::new()), verifier);
        match token {
            Some(t) => state.with_access_token(SecretString::new(t.to_string())),
            None => state,
        }
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/access/user-1");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn open_when_no_token_configured() {
        let result = RequireAccessToken::from_request_parts(&mut parts(None), &state(None)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let result =
            RequireAccessToken::from_request_parts(&mut parts(None), &state(Some("s3cret"))).await;
        assert_eq!(result.unwrap_err(), AccessTokenRejection::Missing);
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let result = RequireAccessToken::from_request_parts(
            &mut parts(Some("Bearer guess")),
            &state(Some("s3cret")),
        )
        .await;
        assert_eq!(result.unwrap_err(), AccessTokenRejection::Invalid);
    }

    #[tokio::test]
    async fn matching_token_is_admitted() {
        let result = RequireAccessToken::from_request_parts(
            &mut parts(Some("Bearer s3cret")),
            &state(Some("s3cret")),
        )
        .await;
        assert!(result.is_ok());
    }

    #[test]
    fn rejection_is_401() {
        let response = AccessTokenRejection::Missing.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
