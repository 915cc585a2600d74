use thiserror::Error;

/// Errors from the client transport and session layer.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Server returned error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("No active session")]
    NoSession,
}

pub type ClientResult<T> = Result<T, ClientError>;
