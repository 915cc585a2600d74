//! Conversation state driving the UI.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::chat::MessageRole;

use super::error::{ClientError, ClientResult};
use super::session::Session;
use super::transport::ChatTransport;

/// Delivery state of a locally held message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Sent optimistically, not yet confirmed by the store.
    Pending,
    /// Known to the server.
    Confirmed,
    /// Send failed, kept visible for retry.
    Failed,
}

/// One message in the on-screen list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalMessage {
    pub role: MessageRole,
    pub content: String,
    /// Provisional wall-clock time for optimistic entries, server time once
    /// loaded from history.
    pub created_at: String,
    pub delivery: DeliveryStatus,
}

/// Client-side conversation state.
///
/// The message list is a read-through cache of the store, rebuilt wholesale
/// on session acquisition and extended optimistically on send. It is never
/// authoritative.
pub struct ConversationViewModel {
    transport: Arc<dyn ChatTransport>,
    session: Option<Session>,
    messages: Vec<LocalMessage>,
    input: String,
}

impl ConversationViewModel {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            session: None,
            messages: Vec::new(),
            input: String::new(),
        }
    }

    /// The on-screen message list, oldest first.
    pub fn messages(&self) -> &[LocalMessage] {
        &self.messages
    }

    /// The current input buffer.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Whether a session is active.
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Replace the input buffer, as the UI does on every keystroke.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// React to a session transition from the session provider.
    ///
    /// Acquisition replaces the local list wholesale with the stored
    /// history. Loss clears the list immediately without a network call.
    pub async fn handle_session_change(&mut self, session: Option<Session>) {
        match session {
            Some(session) => {
                match self.transport.fetch_history(&session.user_id).await {
                    Ok(history) => {
                        self.messages = history
                            .into_iter()
                            .map(|row| LocalMessage {
                                role: row.role,
                                content: row.content,
                                created_at: row.created_at,
                                delivery: DeliveryStatus::Confirmed,
                            })
                            .collect();
                    }
                    Err(e) => {
                        warn!(user_id = %session.user_id, error = %e, "Failed to load history");
                        self.messages.clear();
                    }
                }
                self.session = Some(session);
            }
            None => {
                debug!("Session lost, clearing conversation");
                self.session = None;
                self.messages.clear();
            }
        }
    }

    /// Submit the current input buffer as a user turn.
    ///
    /// Whitespace-only input is a no-op with no network call and no list
    /// mutation. Otherwise the user turn is appended optimistically, the
    /// input is cleared, and the send proceeds. On failure the optimistic
    /// entry stays visible, marked failed.
    pub async fn submit(&mut self) -> ClientResult<()> {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return Ok(());
        }
        let session = match &self.session {
            Some(session) => session.clone(),
            None => return Err(ClientError::NoSession),
        };

        self.messages.push(LocalMessage {
            role: MessageRole::User,
            content: text.clone(),
            created_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            delivery: DeliveryStatus::Pending,
        });
        let index = self.messages.len() - 1;
        self.input.clear();

        self.send_at(index, &session.user_id, &text).await
    }

    /// Resend the oldest failed message, if any.
    pub async fn retry_failed(&mut self) -> ClientResult<()> {
        let session = match &self.session {
            Some(session) => session.clone(),
            None => return Err(ClientError::NoSession),
        };
        let Some(index) = self
            .messages
            .iter()
            .position(|m| m.delivery == DeliveryStatus::Failed)
        else {
            return Ok(());
        };

        self.messages[index].delivery = DeliveryStatus::Pending;
        let content = self.messages[index].content.clone();
        self.send_at(index, &session.user_id, &content).await
    }

    async fn send_at(&mut self, index: usize, user_id: &str, text: &str) -> ClientResult<()> {
        match self.transport.send_message(user_id, text).await {
            Ok(reply) => {
                self.messages[index].delivery = DeliveryStatus::Confirmed;
                self.messages.push(LocalMessage {
                    role: MessageRole::Assistant,
                    content: reply,
                    created_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                    delivery: DeliveryStatus::Confirmed,
                });
                Ok(())
            }
            Err(e) => {
                warn!(user_id, error = %e, "Send failed, keeping message visible");
                self.messages[index].delivery = DeliveryStatus::Failed;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::StoredMessage;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeTransport {
        history: Mutex<Vec<StoredMessage>>,
        reply: Option<String>,
        sends: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl FakeTransport {
        fn new(history: Vec<StoredMessage>, reply: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                history: Mutex::new(history),
                reply: reply.map(str::to_string),
                sends: AtomicUsize::new(0),
                fetches: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn send_message(&self, _user_id: &str, _message: &str) -> ClientResult<String> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(ClientError::ApiError {
                    status: 500,
                    message: "upstream failure".to_string(),
                }),
            }
        }

        async fn fetch_history(&self, _user_id: &str) -> ClientResult<Vec<StoredMessage>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.history.lock().unwrap().clone())
        }
    }

    fn session() -> Session {
        Session {
            user_id: "u1".to_string(),
            email: None,
            anonymous: true,
        }
    }

    fn stored(id: i64, role: MessageRole, content: &str) -> StoredMessage {
        StoredMessage {
            id,
            user_id: "u1".to_string(),
            role,
            content: content.to_string(),
            created_at: format!("2026-01-01 00:00:0{}", id),
        }
    }

    #[tokio::test]
    async fn test_session_acquisition_replaces_list() {
        let transport = FakeTransport::new(
            vec![
                stored(1, MessageRole::User, "hello"),
                stored(2, MessageRole::Assistant, "hi there"),
            ],
            Some("ok"),
        );
        let mut vm = ConversationViewModel::new(transport.clone());

        vm.handle_session_change(Some(session())).await;
        assert_eq!(vm.messages().len(), 2);
        assert!(vm
            .messages()
            .iter()
            .all(|m| m.delivery == DeliveryStatus::Confirmed));
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_loss_clears_without_network() {
        let transport = FakeTransport::new(vec![stored(1, MessageRole::User, "hello")], None);
        let mut vm = ConversationViewModel::new(transport.clone());

        vm.handle_session_change(Some(session())).await;
        assert_eq!(vm.messages().len(), 1);

        vm.handle_session_change(None).await;
        assert!(vm.messages().is_empty());
        assert!(!vm.is_signed_in());
        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_input_is_a_noop() {
        let transport = FakeTransport::new(vec![], Some("never"));
        let mut vm = ConversationViewModel::new(transport.clone());
        vm.handle_session_change(Some(session())).await;

        vm.set_input("   ");
        vm.submit().await.unwrap();

        assert!(vm.messages().is_empty());
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_submit_appends_both_turns() {
        let transport = FakeTransport::new(vec![], Some("hi there"));
        let mut vm = ConversationViewModel::new(transport.clone());
        vm.handle_session_change(Some(session())).await;

        vm.set_input("hello");
        vm.submit().await.unwrap();

        assert!(vm.input().is_empty());
        let messages = vm.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].delivery, DeliveryStatus::Confirmed);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_message_marked_failed() {
        let transport = FakeTransport::new(vec![], None);
        let mut vm = ConversationViewModel::new(transport.clone());
        vm.handle_session_change(Some(session())).await;

        vm.set_input("hello");
        assert!(vm.submit().await.is_err());

        let messages = vm.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[0].delivery, DeliveryStatus::Failed);
        // Input is still cleared, the message itself carries the state.
        assert!(vm.input().is_empty());
    }

    #[tokio::test]
    async fn test_retry_confirms_failed_message() {
        let transport = FakeTransport::new(vec![], None);
        let mut vm = ConversationViewModel::new(transport.clone());
        vm.handle_session_change(Some(session())).await;

        vm.set_input("hello");
        assert!(vm.submit().await.is_err());

        // Swap in a transport that succeeds.
        vm.transport = FakeTransport::new(vec![], Some("hi there"));
        vm.retry_failed().await.unwrap();

        let messages = vm.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].delivery, DeliveryStatus::Confirmed);
        assert_eq!(messages[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_submit_without_session_is_rejected() {
        let transport = FakeTransport::new(vec![], Some("never"));
        let mut vm = ConversationViewModel::new(transport.clone());

        vm.set_input("hello");
        let err = vm.submit().await.unwrap_err();
        assert!(matches!(err, ClientError::NoSession));
        assert!(vm.messages().is_empty());
        assert_eq!(transport.sends.load(Ordering::SeqCst), 0);
    }
}
