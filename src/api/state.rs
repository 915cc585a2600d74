//! Application state shared across handlers.

use std::sync::Arc;

use crate::auth::AuthState;
use crate::chat::MessageRepository;
use crate::gateway::ChatGateway;
use crate::user::UserService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Chat gateway handling the send-message flow.
    pub gateway: Arc<ChatGateway>,
    /// Message repository for history reads.
    pub messages: MessageRepository,
    /// User service for registration and login.
    pub users: Arc<UserService>,
    /// Authentication state.
    pub auth: AuthState,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        gateway: ChatGateway,
        messages: MessageRepository,
        users: UserService,
        auth: AuthState,
    ) -> Self {
        Self {
            gateway: Arc::new(gateway),
            messages,
            users: Arc::new(users),
            auth,
        }
    }
}
