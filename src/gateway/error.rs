//! Gateway error types.

use thiserror::Error;

use crate::completion::CompletionError;

/// Errors surfaced by the send-message flow.
///
/// Store write failures are deliberately absent: they are logged inside the
/// gateway and never block the reply path.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Malformed or missing input. Terminal, produces no side effects.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The completion service failed. No reply is persisted.
    #[error("completion service failure: {0}")]
    Upstream(#[from] CompletionError),
}
