//! Chat gateway: the send-message flow.
//!
//! One invocation per request, no shared mutable state across requests.
//! Within an invocation the steps run strictly in order: persist the user
//! turn, request a completion, persist the assistant turn. Sequencing comes
//! from data dependency, not from a transaction, and nothing is retried.

mod error;
mod service;

pub use error::GatewayError;
pub use service::{ChatGateway, ChatGatewayConfig};
