//! Access grantee port.
//!
//! A grantee applies an entitlement decision to some external resource,
//! e.g. a shared drive's permission list.

use crate::domain::foundation::UserId;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from applying a grant or revoke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Consumer answered with a non-success status.
    #[error("Rejected with status {status}")]
    Rejected { status: u16 },
}

/// Port for consumers of entitlement decisions.
///
/// Both operations must be idempotent.
#[async_trait]
pub trait AccessGrantee: Send + Sync {
    /// Name used in logs and sync reports.
    fn name(&self) -> &str;

    async fn grant(&self, user_id: &UserId) -> Result<(), AccessError>;

    async fn revoke(&self, user_id: &UserId) -> Result<(), AccessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_grantee_is_object_safe() {
        fn _accepts_dyn(_grantee: &dyn AccessGrantee) {}
    }

    #[test]
    fn rejected_displays_status() {
        assert_eq!(
            AccessError::Rejected { status: 403 }.to_string(),
            "Rejected with status 403"
        );
    }
}
