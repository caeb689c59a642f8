//! Downstream access grant configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where entitlement changes are pushed
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Grant/revoke callback; unset disables syncing after webhooks
    pub grant_webhook_url: Option<String>,

    /// Callback timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bearer token required on `/api/access/*`; unset leaves them open
    #[serde(default)]
    pub api_token: Option<SecretString>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            grant_webhook_url: None,
            timeout_secs: default_timeout(),
            api_token: None,
        }
    }
}

fn default_timeout() -> u64 {
    5
}

impl AccessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate access configuration
    ///
    /// Production deployments must protect the access routes.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        match &self.api_token {
            Some(token) if token.expose_secret().is_empty() => {
                return Err(ValidationError::EmptyAccessToken);
            }
            None if production => {
                return Err(ValidationError::MissingRequired("ACCESS_API_TOKEN"));
            }
            _ => {}
        }
        if let Some(url) = &self.grant_webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidGrantWebhookUrl);
            }
        }
        if self.timeout_secs == 0 || self.timeout_secs > 60 {
            return Err(ValidationError::InvalidGrantTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_url_is_valid() {
        assert!(AccessConfig::default().validate(false).is_ok());
    }

    #[test]
    fn url_must_be_http() {
        let config = AccessConfig {
            grant_webhook_url: Some("ftp://grants.local".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidGrantWebhookUrl));

        let config = AccessConfig {
            grant_webhook_url: Some("https://grants.local/hook".to_string()),
            ..Default::default()
        };
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn timeout_is_bounded() {
        let config = AccessConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(false), Err(ValidationError::InvalidGrantTimeout));
    }

    #[test]
    fn production_requires_api_token() {
        assert_eq!(
            AccessConfig::default().validate(true),
            Err(ValidationError::MissingRequired("ACCESS_API_TOKEN"))
        );

        let config = AccessConfig {
            api_token: Some(SecretString::new("internal-token".to_string())),
            ..Default::default()
        };
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn empty_api_token_is_rejected() {
        let config = AccessConfig {
            api_token: Some(SecretString::new(String::new())),
            ..Default::default()
        };
        assert_eq!(config.validate(false), Err(ValidationError::EmptyAccessToken));
    }
}
