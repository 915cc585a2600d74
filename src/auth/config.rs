//! Authentication configuration.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// A dev-mode test user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevUser {
    pub id: String,
    pub email: String,
    pub password: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Dev mode: enables dev users and the `X-Dev-User` header bypass.
    pub dev_mode: bool,
    /// Secret for signing and validating JWTs. Required to issue tokens.
    pub jwt_secret: Option<String>,
    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// Origins allowed by CORS. Empty means localhost defaults in dev mode.
    pub allowed_origins: Vec<String>,
    /// Dev-mode users, only honored when `dev_mode` is set.
    pub dev_users: Vec<DevUser>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            dev_mode: cfg!(debug_assertions),
            jwt_secret: None,
            token_ttl_secs: 60 * 60 * 24,
            allowed_origins: Vec::new(),
            dev_users: vec![DevUser {
                id: "dev".to_string(),
                email: "dev@localhost".to_string(),
                password: "devpassword123".to_string(),
            }],
        }
    }
}

impl AuthConfig {
    /// Validate the configuration before serving.
    pub fn validate(&self) -> Result<()> {
        match &self.jwt_secret {
            Some(secret) if secret.len() < 32 => {
                bail!("auth.jwt_secret must be at least 32 characters")
            }
            None if !self.dev_mode => {
                bail!("auth.jwt_secret is required outside dev mode")
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_short_secret() {
        let config = AuthConfig {
            jwt_secret: Some("short".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_secret_in_production() {
        let config = AuthConfig {
            dev_mode: false,
            jwt_secret: None,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let ok = AuthConfig {
            dev_mode: false,
            jwt_secret: Some("0123456789abcdef0123456789abcdef".to_string()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }
}
