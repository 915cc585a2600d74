//! Test utilities and common setup.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use parley::api;
use parley::auth::{AuthConfig, AuthState};
use parley::chat::MessageRepository;
use parley::completion::{ChatTurn, CompletionApi, CompletionError, CompletionResult};
use parley::db::Database;
use parley::gateway::{ChatGateway, ChatGatewayConfig};
use parley::user::{UserRepository, UserService};

/// Completion stub that returns a fixed reply, or fails when no reply is set.
pub struct ScriptedCompletion {
    reply: Option<String>,
}

impl ScriptedCompletion {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { reply: None })
    }
}

#[async_trait]
impl CompletionApi for ScriptedCompletion {
    async fn complete(&self, _turns: &[ChatTurn]) -> CompletionResult<String> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(CompletionError::ApiError {
                status: 503,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// Create a test AuthConfig with a JWT secret for testing.
fn test_auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.dev_mode = true;
    // Set a JWT secret for tests (required for token generation)
    config.jwt_secret = Some("test-secret-for-integration-tests-minimum-32-chars".to_string());
    config
}

/// Create a test application with the given completion stub, plus a valid
/// token for user "u1".
pub async fn test_app_with_completion(completion: Arc<ScriptedCompletion>) -> (Router, String) {
    // Use in-memory database for tests
    let db = Database::in_memory().await.unwrap();

    // Create auth state in dev mode with JWT secret
    let auth_config = test_auth_config();
    let auth_state = AuthState::new(auth_config);

    // Handlers only act for the token subject, so issue the token for the
    // same user id the tests send on the wire.
    let token = auth_state.generate_token("u1", None, false).unwrap();

    let message_repo = MessageRepository::new(db.pool().clone());
    let gateway = ChatGateway::new(
        message_repo.clone(),
        completion,
        ChatGatewayConfig::default(),
    );

    let user_repo = UserRepository::new(db.pool().clone());
    let user_service = UserService::new(user_repo);

    let state = api::AppState::new(gateway, message_repo, user_service, auth_state);
    (api::create_router(state), token)
}

/// Create a test application whose completion stub replies "hi there".
pub async fn test_app() -> Router {
    let (app, _token) = test_app_with_completion(ScriptedCompletion::replying("hi there")).await;
    app
}

/// Create a test application and return a valid token for user "u1".
pub async fn test_app_with_token() -> (Router, String) {
    test_app_with_completion(ScriptedCompletion::replying("hi there")).await
}
