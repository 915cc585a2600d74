//! Session tracking and change notification.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::error::ClientResult;
use super::transport::AuthApi;

/// An authenticated session as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub anonymous: bool,
}

/// Subscription handle for session changes.
///
/// Dropping the handle ends the subscription. `changed` resolves whenever
/// the session is acquired, replaced, or lost.
pub struct SessionEvents {
    receiver: watch::Receiver<Option<Session>>,
}

impl SessionEvents {
    /// Wait for the next session change.
    ///
    /// Returns `Some(state)` with the new session state, or `None` once
    /// the provider has been dropped and no further changes can arrive.
    pub async fn changed(&mut self) -> Option<Option<Session>> {
        if self.receiver.changed().await.is_err() {
            return None;
        }
        Some(self.receiver.borrow_and_update().clone())
    }

    /// The current session state without waiting.
    pub fn current(&self) -> Option<Session> {
        self.receiver.borrow().clone()
    }
}

/// Owns the client's session and broadcasts changes to subscribers.
///
/// All sign-in variants replace the current session wholesale. Sign-out
/// clears the local session even when the server call fails, so a broken
/// network cannot leave the client stuck in a signed-in state.
pub struct SessionProvider {
    auth: Arc<dyn AuthApi>,
    sender: watch::Sender<Option<Session>>,
}

impl SessionProvider {
    /// Create a provider with no active session.
    pub fn new(auth: Arc<dyn AuthApi>) -> Self {
        let (sender, _) = watch::channel(None);
        Self { auth, sender }
    }

    /// The current session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> SessionEvents {
        SessionEvents {
            receiver: self.sender.subscribe(),
        }
    }

    /// Create a new account and start a session for it.
    pub async fn sign_up(&self, email: &str, password: &str) -> ClientResult<Session> {
        let auth = self.auth.register(email, password).await?;
        let session = Session {
            user_id: auth.user.id,
            email: auth.user.email,
            anonymous: auth.user.anonymous,
        };
        info!(user_id = %session.user_id, "Signed up");
        self.sender.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Sign in with existing credentials.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<Session> {
        let auth = self.auth.login(email, password).await?;
        let session = Session {
            user_id: auth.user.id,
            email: auth.user.email,
            anonymous: auth.user.anonymous,
        };
        info!(user_id = %session.user_id, "Signed in");
        self.sender.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Sign in as a throwaway anonymous user.
    pub async fn sign_in_anonymously(&self) -> ClientResult<Session> {
        let auth = self.auth.login_anonymous().await?;
        let session = Session {
            user_id: auth.user.id,
            email: None,
            anonymous: true,
        };
        info!(user_id = %session.user_id, "Signed in anonymously");
        self.sender.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// End the current session.
    pub async fn sign_out(&self) -> ClientResult<()> {
        let result = self.auth.logout().await;
        if let Err(e) = &result {
            warn!(error = %e, "Server logout failed, clearing local session anyway");
        }
        self.sender.send_replace(None);
        result
    }
}
