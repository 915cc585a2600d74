//! Authentication state, middleware, and request extractors.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::header,
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::claims::Claims;
use super::config::{AuthConfig, DevUser};
use super::error::AuthError;

/// Shared authentication state.
#[derive(Clone)]
pub struct AuthState {
    config: Arc<AuthConfig>,
}

impl AuthState {
    /// Create authentication state from configuration.
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn is_dev_mode(&self) -> bool {
        self.config.dev_mode
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.config.allowed_origins
    }

    pub fn dev_users(&self) -> &[DevUser] {
        &self.config.dev_users
    }

    /// Check dev-mode credentials against the configured dev users.
    pub fn validate_dev_credentials(&self, email: &str, password: &str) -> Option<&DevUser> {
        if !self.config.dev_mode {
            return None;
        }
        self.config
            .dev_users
            .iter()
            .find(|u| u.email == email && u.password == password)
    }

    /// Issue a token for a user account.
    pub fn generate_token(
        &self,
        user_id: &str,
        email: Option<&str>,
        anonymous: bool,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: now + self.config.token_ttl_secs,
            iat: Some(now),
            email: email.map(str::to_string),
            anonymous,
        };

        encode(&Header::default(), &claims, &self.encoding_key()?)
            .map_err(|e| AuthError::Internal(format!("signing token: {e}")))
    }

    /// Issue a token for a dev-mode user.
    pub fn generate_dev_token(&self, user: &DevUser) -> Result<String, AuthError> {
        self.generate_token(&user.id, Some(&user.email), false)
    }

    /// Validate a token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key()?, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;
        Ok(data.claims)
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        match &self.config.jwt_secret {
            Some(secret) => Ok(secret.as_bytes()),
            // Dev mode without an explicit secret still needs a stable key
            // so tokens survive within one process lifetime.
            None if self.config.dev_mode => Ok(b"parley-dev-secret-do-not-use-in-production"),
            None => Err(AuthError::Internal("jwt_secret not configured".to_string())),
        }
    }

    fn encoding_key(&self) -> Result<EncodingKey, AuthError> {
        Ok(EncodingKey::from_secret(self.secret()?))
    }

    fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        Ok(DecodingKey::from_secret(self.secret()?))
    }
}

/// The authenticated caller, inserted by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub claims: Claims,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.claims.sub
    }

    pub fn display_name(&self) -> &str {
        self.claims.display_name()
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Middleware enforcing authentication on protected routes.
///
/// Accepts an `X-Dev-User` header naming a configured dev user (dev mode
/// only), then `Authorization: Bearer <jwt>`, then an `auth_token` cookie.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Dev header bypass for tests and local tooling.
    if auth.is_dev_mode() {
        if let Some(dev_id) = request
            .headers()
            .get("x-dev-user")
            .and_then(|v| v.to_str().ok())
        {
            let user = auth
                .dev_users()
                .iter()
                .find(|u| u.id == dev_id)
                .ok_or(AuthError::InvalidCredentials)?;
            let now = Utc::now().timestamp();
            let claims = Claims {
                sub: user.id.clone(),
                exp: now + 3600,
                iat: Some(now),
                email: Some(user.email.clone()),
                anonymous: false,
            };
            debug!(user_id = %claims.sub, "Dev header authentication");
            request.extensions_mut().insert(CurrentUser { claims });
            return Ok(next.run(request).await);
        }
    }

    let token = extract_token(&request)?.ok_or(AuthError::MissingAuthHeader)?;
    let claims = auth.validate_token(&token)?;

    request.extensions_mut().insert(CurrentUser { claims });
    Ok(next.run(request).await)
}

/// Pull a JWT out of the bearer header or the `auth_token` cookie.
///
/// An Authorization header that is present but not a bearer token is an
/// error, not a fallthrough to the cookie.
fn extract_token(request: &Request) -> Result<Option<String>, AuthError> {
    if let Some(value) = request.headers().get(header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        return match value.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.trim().to_string())),
            None => Err(AuthError::InvalidAuthHeader),
        };
    }

    Ok(request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|pair| {
                pair.trim()
                    .strip_prefix("auth_token=")
                    .map(str::to_string)
            })
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn test_state() -> AuthState {
        AuthState::new(AuthConfig {
            dev_mode: true,
            jwt_secret: Some("test-secret-for-auth-tests-minimum-32-chars".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_token_roundtrip() {
        let auth = test_state();
        let token = auth
            .generate_token("usr_1", Some("a@example.com"), false)
            .unwrap();

        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "usr_1");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));
        assert!(!claims.anonymous);
    }

    #[test]
    fn test_anonymous_token() {
        let auth = test_state();
        let token = auth.generate_token("usr_guest", None, true).unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert!(claims.anonymous);
        assert_eq!(claims.display_name(), "usr_guest");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let auth = test_state();
        assert!(matches!(
            auth.validate_token("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    fn request_with_auth(value: &str) -> Request {
        Request::builder()
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_token_sources() {
        let request = request_with_auth("Bearer abc123");
        assert_eq!(extract_token(&request).unwrap().as_deref(), Some("abc123"));

        let request = Request::builder()
            .header(header::COOKIE, "theme=dark; auth_token=abc123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&request).unwrap().as_deref(), Some("abc123"));

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_token(&request).unwrap(), None);
    }

    #[test]
    fn test_malformed_auth_header_is_an_error() {
        for value in ["Basic Zm9vOmJhcg==", "abc123", "bearer abc123"] {
            let request = request_with_auth(value);
            assert!(matches!(
                extract_token(&request),
                Err(AuthError::InvalidAuthHeader)
            ));
        }
    }

    #[test]
    fn test_dev_credentials() {
        let auth = test_state();
        assert!(
            auth.validate_dev_credentials("dev@localhost", "devpassword123")
                .is_some()
        );
        assert!(auth.validate_dev_credentials("dev@localhost", "nope").is_none());

        let prod = AuthState::new(AuthConfig {
            dev_mode: false,
            jwt_secret: Some("test-secret-for-auth-tests-minimum-32-chars".to_string()),
            ..Default::default()
        });
        assert!(
            prod.validate_dev_credentials("dev@localhost", "devpassword123")
                .is_none()
        );
    }
}
