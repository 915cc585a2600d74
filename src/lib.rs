//! Parley Chat Server Library
//!
//! This library provides the core components for the Parley chat service:
//! the HTTP API, the chat gateway, persistence, and the client-side
//! session and conversation state.

pub mod api;
pub mod auth;
pub mod chat;
pub mod client;
pub mod completion;
pub mod db;
pub mod gateway;
pub mod user;
