//! HTTP API module.
//!
//! Provides the REST endpoints for chat, history, and authentication.

mod error;
mod handlers;
mod routes;
mod state;

// Re-export error types for external use
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{
    HealthResponse, HistoryResponse, LoginRequest, LoginResponse, RegisterRequest,
    SendMessageRequest, SendMessageResponse, UserInfo,
};
pub use routes::create_router;
pub use state::AppState;
