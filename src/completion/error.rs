//! Completion client error types.

use thiserror::Error;

/// Result type for completion operations.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Errors that can occur when requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The service returned a non-success status.
    #[error("completion service error: {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("failed to parse response: {0}")]
    ParseError(String),

    /// The response carried no choices.
    #[error("completion response contained no choices")]
    EmptyChoices,
}
