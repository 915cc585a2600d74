//! User accounts backing the session provider.
//!
//! Supports email+password registration, credential verification, and
//! throwaway anonymous identities (guest login).

mod models;
mod repository;
mod service;

pub use models::{CreateUserRequest, User};
pub use repository::UserRepository;
pub use service::UserService;
