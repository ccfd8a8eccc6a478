//! WebSocket message types.

pub mod types;

pub use types::{EventAck, InboundEnvelope, InboundMessage, SendMessage};
