//! The send-message flow.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::chat::{MessageRepository, MessageRole, NewMessage};
use crate::completion::{ChatTurn, CompletionApi};

use super::error::GatewayError;

/// Gateway behavior knobs.
#[derive(Debug, Clone)]
pub struct ChatGatewayConfig {
    /// Fixed system instruction prepended to every completion request.
    pub system_prompt: String,
    /// When true, prior stored turns are included in the model context.
    /// The default (false) preserves the reference single-turn behavior.
    pub include_history: bool,
}

impl Default for ChatGatewayConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are a helpful assistant.".to_string(),
            include_history: false,
        }
    }
}

/// Server-side handler for one user turn: persist it, ask the completion
/// service for a reply, persist the reply, return it.
#[derive(Clone)]
pub struct ChatGateway {
    messages: MessageRepository,
    completion: Arc<dyn CompletionApi>,
    config: ChatGatewayConfig,
}

impl ChatGateway {
    /// Create a new gateway.
    pub fn new(
        messages: MessageRepository,
        completion: Arc<dyn CompletionApi>,
        config: ChatGatewayConfig,
    ) -> Self {
        Self {
            messages,
            completion,
            config,
        }
    }

    /// Handle one user turn and return the assistant's reply.
    ///
    /// Store writes are best-effort: a failed append is logged and the flow
    /// continues, so a flaky store cannot block the user-visible reply.
    /// A completion failure is terminal and persists no assistant turn.
    #[instrument(skip(self, message), fields(user_id = %user_id))]
    pub async fn send_message(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<String, GatewayError> {
        if user_id.trim().is_empty() {
            return Err(GatewayError::InvalidRequest("missing user_id".to_string()));
        }
        if message.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "no message provided".to_string(),
            ));
        }

        // Prior turns are read before the new turn is written so the new
        // turn appears exactly once in the model context.
        let prior = if self.config.include_history {
            match self.messages.list_for_user(user_id).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(user_id, error = %e, "Failed to load prior turns, sending single-turn context");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        if let Err(e) = self
            .messages
            .append(NewMessage {
                user_id: user_id.to_string(),
                role: MessageRole::User,
                content: message.to_string(),
            })
            .await
        {
            warn!(user_id, error = %e, "Failed to persist user turn, continuing");
        }

        let mut turns = Vec::with_capacity(prior.len() + 2);
        turns.push(ChatTurn::system(&self.config.system_prompt));
        for row in &prior {
            turns.push(match row.role {
                MessageRole::User => ChatTurn::user(&row.content),
                MessageRole::Assistant => ChatTurn::assistant(&row.content),
            });
        }
        turns.push(ChatTurn::user(message));

        let reply = self.completion.complete(&turns).await?;

        if let Err(e) = self
            .messages
            .append(NewMessage {
                user_id: user_id.to_string(),
                role: MessageRole::Assistant,
                content: reply.clone(),
            })
            .await
        {
            warn!(user_id, error = %e, "Failed to persist assistant turn");
        }

        info!(user_id, reply_len = reply.len(), "Completed send-message flow");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionError, CompletionResult};
    use crate::db::Database;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted completion service: returns a fixed reply or fails, and
    /// records every request it receives.
    struct ScriptedCompletion {
        reply: Option<String>,
        calls: AtomicUsize,
        last_turns: Mutex<Vec<ChatTurn>>,
    }

    impl ScriptedCompletion {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_turns: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
                last_turns: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionApi for ScriptedCompletion {
        async fn complete(&self, turns: &[ChatTurn]) -> CompletionResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_turns.lock().unwrap() = turns.to_vec();
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(CompletionError::ApiError {
                    status: 503,
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    async fn setup(
        completion: Arc<ScriptedCompletion>,
        config: ChatGatewayConfig,
    ) -> (Database, MessageRepository, ChatGateway) {
        let db = Database::in_memory().await.unwrap();
        let repo = MessageRepository::new(db.pool().clone());
        let gateway = ChatGateway::new(repo.clone(), completion, config);
        (db, repo, gateway)
    }

    #[tokio::test]
    async fn test_successful_send_persists_both_turns() {
        let completion = ScriptedCompletion::replying("hi there");
        let (_db, repo, gateway) =
            setup(completion.clone(), ChatGatewayConfig::default()).await;

        let reply = gateway.send_message("u1", "hello").await.unwrap();
        assert_eq!(reply, "hi there");

        let rows = repo.list_for_user("u1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, MessageRole::User);
        assert_eq!(rows[0].content, "hello");
        assert_eq!(rows[1].role, MessageRole::Assistant);
        assert_eq!(rows[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_single_turn_context_by_default() {
        let completion = ScriptedCompletion::replying("second reply");
        let (_db, _repo, gateway) =
            setup(completion.clone(), ChatGatewayConfig::default()).await;

        gateway.send_message("u1", "first").await.unwrap();
        gateway.send_message("u1", "second").await.unwrap();

        // System instruction plus the new turn only, regardless of history.
        let turns = completion.last_turns.lock().unwrap().clone();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "second");
    }

    #[tokio::test]
    async fn test_full_history_context_when_enabled() {
        let completion = ScriptedCompletion::replying("ok");
        let config = ChatGatewayConfig {
            include_history: true,
            ..Default::default()
        };
        let (_db, _repo, gateway) = setup(completion.clone(), config).await;

        gateway.send_message("u1", "first").await.unwrap();
        gateway.send_message("u1", "second").await.unwrap();

        // system, prior user, prior assistant, new user
        let turns = completion.last_turns.lock().unwrap().clone();
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["You are a helpful assistant.", "first", "ok", "second"]
        );
    }

    #[tokio::test]
    async fn test_invalid_input_has_no_side_effects() {
        let completion = ScriptedCompletion::replying("never");
        let (_db, repo, gateway) =
            setup(completion.clone(), ChatGatewayConfig::default()).await;

        let err = gateway.send_message("", "hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));

        let err = gateway.send_message("u1", "   ").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)));

        assert_eq!(completion.call_count(), 0);
        assert_eq!(repo.count_for_user("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_completion_failure_keeps_user_turn_only() {
        let completion = ScriptedCompletion::failing();
        let (_db, repo, gateway) =
            setup(completion.clone(), ChatGatewayConfig::default()).await;

        let err = gateway.send_message("u1", "hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
        assert_eq!(completion.call_count(), 1);

        let rows = repo.list_for_user("u1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role, MessageRole::User);
    }
}
