//! Completion service client.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint. The service
//! is stateless request/response: each call carries its full context and a
//! single attempt is made, never retried.

mod client;
mod error;
mod types;

pub use client::CompletionClient;
pub use error::{CompletionError, CompletionResult};
pub use types::{ChatTurn, TurnRole};

use async_trait::async_trait;

/// Trait seam for the completion service, so the gateway can be tested
/// against a scripted implementation.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Request a reply for the given ordered conversation context.
    async fn complete(&self, turns: &[ChatTurn]) -> CompletionResult<String>;
}
