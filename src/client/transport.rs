//! HTTP transport for talking to the chat server.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chat::StoredMessage;

use super::error::{ClientError, ClientResult};

/// Outcome of a successful authentication call.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: AuthUser,
}

/// User identity in an authentication response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub anonymous: bool,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    reply: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: Vec<StoredMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Message-path operations against the server.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one user turn and return the assistant reply.
    async fn send_message(&self, user_id: &str, message: &str) -> ClientResult<String>;

    /// Fetch the stored conversation for a user, oldest first.
    async fn fetch_history(&self, user_id: &str) -> ClientResult<Vec<StoredMessage>>;
}

/// Authentication operations against the server.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> ClientResult<AuthResponse>;
    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse>;
    async fn login_anonymous(&self) -> ClientResult<AuthResponse>;
    async fn logout(&self) -> ClientResult<()>;
}

/// HTTP client for the chat server API.
///
/// Holds the bearer token from the latest successful authentication and
/// attaches it to message-path requests.
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl GatewayClient {
    /// Create a new client for the given server base URL.
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn store_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    async fn parse_error(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = match response.text().await {
            Ok(body) => match serde_json::from_str::<ErrorBody>(&body) {
                Ok(parsed) => parsed.error,
                Err(_) => body,
            },
            Err(e) => e.to_string(),
        };
        ClientError::ApiError { status, message }
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    async fn auth_call(&self, path: &str, body: serde_json::Value) -> ClientResult<AuthResponse> {
        let auth: AuthResponse = self.post_json(path, &body).await?;
        debug!(user_id = %auth.user.id, "Authenticated against server");
        self.store_token(Some(auth.token.clone()));
        Ok(auth)
    }
}

#[async_trait]
impl ChatTransport for GatewayClient {
    async fn send_message(&self, user_id: &str, message: &str) -> ClientResult<String> {
        let body = serde_json::json!({ "user_id": user_id, "message": message });
        let response: SendMessageResponse = self.post_json("/chat", &body).await?;
        Ok(response.reply)
    }

    async fn fetch_history(&self, user_id: &str) -> ClientResult<Vec<StoredMessage>> {
        let mut request = self
            .client
            .get(self.url("/history"))
            .query(&[("user_id", user_id)]);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }
        let body: HistoryResponse = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        Ok(body.history)
    }
}

#[async_trait]
impl AuthApi for GatewayClient {
    async fn register(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        self.auth_call(
            "/auth/register",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        self.auth_call(
            "/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn login_anonymous(&self) -> ClientResult<AuthResponse> {
        self.auth_call("/auth/anonymous", serde_json::json!({})).await
    }

    async fn logout(&self) -> ClientResult<()> {
        let request = match self.bearer() {
            Some(token) => self.client.post(self.url("/auth/logout")).bearer_auth(token),
            None => self.client.post(self.url("/auth/logout")),
        };
        let response = request.send().await?;
        self.store_token(None);
        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_cleanly() {
        let client = GatewayClient::new("http://localhost:3030/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/chat"), "http://localhost:3030/chat");
    }

    #[test]
    fn test_token_storage() {
        let client = GatewayClient::new("http://localhost:3030", Duration::from_secs(5)).unwrap();
        assert!(client.bearer().is_none());
        client.store_token(Some("tok".to_string()));
        assert_eq!(client.bearer().as_deref(), Some("tok"));
        client.store_token(None);
        assert!(client.bearer().is_none());
    }
}
