//! Response DTOs for subscription endpoints.

use serde::Serialize;

use crate::application::handlers::subscription::{AccessAction, GranteeFailure, SyncAccessResult};
use crate::domain::subscription::{Entitlement, EntitlementReason};

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookReceivedResponse {
    pub received: bool,
}

impl WebhookReceivedResponse {
    pub fn ok() -> Self {
        Self { received: true }
    }
}

/// Download gate answer.
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementResponse {
    pub user_id: String,
    pub entitled: bool,
    pub status: Option<String>,
    /// RFC 3339.
    pub end_date: Option<String>,
    pub reason: &'static str,
}

impl From<&Entitlement> for EntitlementResponse {
    fn from(e: &Entitlement) -> Self {
        Self {
            user_id: e.user_id.to_string(),
            entitled: e.entitled,
            status: e.status.map(|s| s.as_str().to_string()),
            end_date: e.end_date.map(|t| t.as_datetime().to_rfc3339()),
            reason: reason_code(&e.reason),
        }
    }
}

fn reason_code(reason: &EntitlementReason) -> &'static str {
    match reason {
        EntitlementReason::Active => "active",
        EntitlementReason::Trialing => "trialing",
        EntitlementReason::NoSubscription => "no_subscription",
        EntitlementReason::StatusNotEntitled(_) => "status_not_entitled",
        EntitlementReason::PeriodEnded => "period_ended",
    }
}

/// Result of a grantee sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncAccessResponse {
    pub user_id: String,
    pub entitled: bool,
    pub action: AccessAction,
    pub failures: Vec<GranteeFailure>,
}

impl From<SyncAccessResult> for SyncAccessResponse {
    fn from(result: SyncAccessResult) -> Self {
        Self {
            user_id: result.entitlement.user_id.to_string(),
            entitled: result.entitlement.entitled,
            action: result.action,
            failures: result.failures,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response for JSON endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::subscription::SubscriptionStatus;

    #[test]
    fn entitlement_response_serializes_flat() {
        let entitlement = Entitlement {
            user_id: UserId::new("user-1").unwrap(),
            entitled: false,
            status: Some(SubscriptionStatus::PastDue),
            end_date: Some(Timestamp::from_unix_secs(1_702_592_000).unwrap()),
            reason: EntitlementReason::StatusNotEntitled(SubscriptionStatus::PastDue),
        };

        let json = serde_json::to_value(EntitlementResponse::from(&entitlement)).unwrap();

        assert_eq!(json["user_id"], "user-1");
        assert_eq!(json["entitled"], false);
        assert_eq!(json["status"], "past_due");
        assert_eq!(json["reason"], "status_not_entitled");
        assert!(json["end_date"].as_str().unwrap().starts_with("2023-12-14T22:13:20"));
    }

    #[test]
    fn webhook_ack_body() {
        let json = serde_json::to_string(&WebhookReceivedResponse::ok()).unwrap();
        assert_eq!(json, r#"{"received":true}"#);
    }
}
