//! Commands processed by the hub coordinator.

use std::sync::Arc;

use tokio::sync::oneshot;

use quikchat_core::types::{ConnectionId, UserId};

use crate::connection::ClientHandle;

/// Result of a direct delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Enqueued on the recipient's outbound queue.
    Delivered,
    /// No connection is registered for the recipient.
    Offline,
    /// The recipient's queue was full or closed; the connection was removed.
    Evicted,
}

impl DeliveryOutcome {
    /// Whether the frame reached a live queue.
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// A request to the coordinator task.
#[derive(Debug)]
pub(crate) enum HubCommand {
    Register {
        client: Arc<ClientHandle>,
        reply: oneshot::Sender<()>,
    },
    Unregister {
        user_id: UserId,
        conn_id: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
    Deliver {
        recipient: UserId,
        frame: String,
        reply: oneshot::Sender<DeliveryOutcome>,
    },
    OnlineCount {
        reply: oneshot::Sender<usize>,
    },
    IsOnline {
        user_id: UserId,
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}
