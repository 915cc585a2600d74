//! Client-side building blocks: transport, session tracking, and the
//! conversation view model.
//!
//! The session provider owns the authenticated session and broadcasts
//! changes over a watch channel. The view model reacts to those changes
//! and drives the optimistic send flow against a [`ChatTransport`].

mod error;
mod session;
mod transport;
mod view_model;

pub use error::{ClientError, ClientResult};
pub use session::{Session, SessionEvents, SessionProvider};
pub use transport::{AuthApi, ChatTransport, GatewayClient};
pub use view_model::{ConversationViewModel, DeliveryStatus, LocalMessage};
