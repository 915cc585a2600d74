//! Chat turn persistence.
//!
//! A conversation is not a stored entity: it is derived by reading the
//! append-only `messages` table filtered by user identity, ordered by
//! `created_at` with insertion order as the tie-break.

mod models;
mod repository;

pub use models::{MessageRole, NewMessage, StoredMessage};
pub use repository::MessageRepository;
