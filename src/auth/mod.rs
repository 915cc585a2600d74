//! Authentication module.
//!
//! Provides JWT validation middleware with support for:
//! - Token-based auth (bearer header or `auth_token` cookie)
//! - Dev bypass mode with configurable test users

mod claims;
mod config;
mod error;
mod middleware;

pub use claims::Claims;
pub use config::{AuthConfig, DevUser};
pub use error::AuthError;
pub use middleware::{AuthState, CurrentUser, auth_middleware};
