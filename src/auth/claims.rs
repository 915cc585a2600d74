//! JWT claims.

use serde::{Deserialize, Serialize};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: String,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Issued at (as Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,

    /// User's email.
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the subject is an anonymous (guest) account.
    #[serde(default)]
    pub anonymous: bool,
}

impl Claims {
    /// Get the display name for the user.
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let claims = Claims {
            sub: "usr_123".to_string(),
            exp: 0,
            iat: None,
            email: Some("user@example.com".to_string()),
            anonymous: false,
        };
        assert_eq!(claims.display_name(), "user@example.com");

        let anon = Claims {
            email: None,
            anonymous: true,
            ..claims
        };
        assert_eq!(anon.display_name(), "usr_123");
    }

    #[test]
    fn test_claims_roundtrip() {
        let claims = Claims {
            sub: "usr_123".to_string(),
            exp: 1_900_000_000,
            iat: Some(1_800_000_000),
            email: None,
            anonymous: true,
        };
        let json = serde_json::to_string(&claims).unwrap();
        let parsed: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sub, "usr_123");
        assert!(parsed.anonymous);
    }
}
