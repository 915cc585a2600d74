//! User models.

use serde::Serialize;

/// A stored user account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub is_anonymous: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

/// Request to create a user.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    /// Already-hashed password; `None` for anonymous users.
    pub password_hash: Option<String>,
    pub is_anonymous: bool,
}
