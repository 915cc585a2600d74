//! HTTP client for the completion service.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::error::{CompletionError, CompletionResult};
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatTurn, CompletionErrorResponse,
};
use super::CompletionApi;

/// Client for an OpenAI-compatible completions API.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the provider (e.g. "https://openrouter.ai/api/v1").
    base_url: String,
    /// Bearer key for the provider.
    api_key: String,
    /// Model identifier sent with every request.
    model: String,
}

impl CompletionClient {
    /// Create a new completion client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> CompletionResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Parse a success or error response body.
    async fn handle_response(&self, response: reqwest::Response) -> CompletionResult<String> {
        let status = response.status();

        if !status.is_success() {
            // Providers usually wrap the message in {"error": {"message": ...}};
            // fall back to the raw body when they don't.
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CompletionErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CompletionError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::ParseError(format!("decoding completion body: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyChoices)
    }
}

#[async_trait]
impl CompletionApi for CompletionClient {
    async fn complete(&self, turns: &[ChatTurn]) -> CompletionResult<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: turns.to_vec(),
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
