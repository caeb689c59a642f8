//! HTTP callback grantee.
//!
//! Posts `{"user_id": "...", "action": "grant" | "revoke"}` to a configured
//! URL. The receiver owns the actual resource (shared drive, file share).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::application::handlers::subscription::AccessAction;
use crate::domain::foundation::UserId;
use crate::ports::{AccessError, AccessGrantee};

#[derive(Debug, Serialize)]
struct GrantRequest<'a> {
    user_id: &'a str,
    action: AccessAction,
}

/// Grantee that forwards decisions to an HTTP endpoint.
pub struct HttpAccessGrantee {
    url: String,
    http_client: reqwest::Client,
}

impl HttpAccessGrantee {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AccessError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AccessError::Http(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http_client,
        })
    }

    async fn send(&self, user_id: &UserId, action: AccessAction) -> Result<(), AccessError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(&GrantRequest {
                user_id: user_id.as_str(),
                action,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %user_id, error = %e, "Grant callback unreachable");
                AccessError::Http(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                user_id = %user_id,
                status = status.as_u16(),
                "Grant callback rejected"
            );
            return Err(AccessError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AccessGrantee for HttpAccessGrantee {
    fn name(&self) -> &str {
        "http_callback"
    }

    async fn grant(&self, user_id: &UserId) -> Result<(), AccessError> {
        self.send(user_id, AccessAction::Grant).await
    }

    async fn revoke(&self, user_id: &UserId) -> Result<(), AccessError> {
        self.send(user_id, AccessAction::Revoke).await
    }
}
