//! Repository for user persistence.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{CreateUserRequest, User};

const USER_COLUMNS: &str = "id, email, password_hash, is_anonymous, created_at, last_login_at";

/// Repository over the `users` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new repository instance.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user with a fresh nanoid identifier.
    pub async fn create(&self, request: CreateUserRequest) -> Result<User> {
        let id = format!("usr_{}", nanoid::nanoid!(12));

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, is_anonymous)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.is_anonymous)
        .execute(&self.pool)
        .await
        .context("inserting user")?;

        self.get(&id)
            .await?
            .context("fetching user after insert")
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("fetching user")
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("fetching user by email")
    }

    /// Check whether an email is unused.
    pub async fn is_email_available(&self, email: &str) -> Result<bool> {
        Ok(self.get_by_email(email).await?.is_none())
    }

    /// Record a successful login.
    pub async fn update_last_login(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("updating last login")?;
        Ok(())
    }
}
