//! User service for business logic.

use anyhow::{Context, Result, bail};
use tracing::{info, instrument};

use super::models::{CreateUserRequest, User};
use super::repository::UserRepository;

/// Service for account operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Register a new user with validation.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<User> {
        if !is_valid_email(email) {
            bail!("Invalid email format.");
        }
        if password.len() < 6 {
            bail!("Password must be at least 6 characters.");
        }
        if !self.repo.is_email_available(email).await? {
            bail!("Email '{}' is already registered.", email);
        }

        let user = self
            .repo
            .create(CreateUserRequest {
                email: Some(email.to_string()),
                password_hash: Some(hash_password(password)?),
                is_anonymous: false,
            })
            .await?;
        info!(user_id = %user.id, "Created new user");

        Ok(user)
    }

    /// Create a throwaway anonymous account (guest login).
    #[instrument(skip(self))]
    pub async fn create_anonymous(&self) -> Result<User> {
        let user = self
            .repo
            .create(CreateUserRequest {
                email: None,
                password_hash: None,
                is_anonymous: true,
            })
            .await?;
        info!(user_id = %user.id, "Created anonymous user");

        Ok(user)
    }

    /// Get a user by ID.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.repo.get(id).await
    }

    /// Verify email/password credentials.
    ///
    /// Returns `None` on unknown email or wrong password; callers decide
    /// how to surface that. Anonymous accounts never verify.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = self.repo.get_by_email(email).await?;

        match user {
            Some(user) => {
                if let Some(hash) = &user.password_hash {
                    if verify_password(password, hash)? {
                        self.repo.update_last_login(&user.id).await?;
                        return Ok(Some(user));
                    }
                }
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    !parts[0].is_empty() && parts[1].contains('.')
}

/// Hash a password using bcrypt.
fn hash_password(password: &str) -> Result<String> {
    // Use a lower cost factor for development speed
    let cost = if cfg!(debug_assertions) { 4 } else { 10 };
    bcrypt::hash(password, cost).context("Failed to hash password")
}

/// Verify a password against a bcrypt hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).context("Failed to verify password")
}
