//! The hub: registry and router for live connections.
//!
//! A single coordinator task ([`registry`]) owns the map of online users.
//! [`Hub`] is the cheap, cloneable front door to it: every registry read or
//! write is a command on a bounded channel, answered over a oneshot. Frame
//! dispatch runs on the caller's task (the connection's read loop), so
//! storage I/O never stalls the coordinator, and talks to the registry only
//! through the same commands.

mod command;
mod dispatch;
mod registry;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use quikchat_core::config::realtime::RealtimeConfig;
use quikchat_core::error::AppError;
use quikchat_core::events::Event;
use quikchat_core::result::AppResult;
use quikchat_core::traits::GroupDirectory;
use quikchat_core::types::UserId;
use quikchat_service::EventService;

use crate::connection::ClientHandle;
use crate::metrics::RealtimeMetrics;

pub use command::DeliveryOutcome;
pub use dispatch::{DispatchOutcome, RejectReason};

use command::HubCommand;
use registry::Registry;

/// Handle to the hub coordinator.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<HubCommand>,
    events: EventService,
    groups: Arc<dyn GroupDirectory>,
    metrics: Arc<RealtimeMetrics>,
    max_content_length: usize,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("max_content_length", &self.max_content_length)
            .finish()
    }
}

impl Hub {
    /// Start the coordinator task and return a handle to it.
    pub fn spawn(
        config: &RealtimeConfig,
        events: EventService,
        groups: Arc<dyn GroupDirectory>,
        metrics: Arc<RealtimeMetrics>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.command_channel_capacity.max(1));
        let task = tokio::spawn(Registry::new(rx, metrics.clone()).run());

        let hub = Self {
            commands: tx,
            events,
            groups,
            metrics,
            max_content_length: config.max_content_length,
        };
        (hub, task)
    }

    /// Metrics shared with the coordinator.
    pub fn metrics(&self) -> &Arc<RealtimeMetrics> {
        &self.metrics
    }

    /// Event storage used by the send and broadcast paths.
    pub fn events(&self) -> &EventService {
        &self.events
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> HubCommand,
    ) -> AppResult<T> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| AppError::service_unavailable("Hub is not running"))?;
        rx.await
            .map_err(|_| AppError::service_unavailable("Hub stopped before replying"))
    }

    /// Add a connection under its user ID.
    ///
    /// A connection already registered for the same user is closed and
    /// replaced.
    pub async fn register(&self, client: Arc<ClientHandle>) -> AppResult<()> {
        self.request(|reply| HubCommand::Register { client, reply })
            .await
    }

    /// Remove a connection if it is still the registered one, and close its
    /// queue. Returns whether this call removed it; repeating it is a no-op.
    pub async fn unregister(&self, client: &ClientHandle) -> bool {
        let removed = self
            .request(|reply| HubCommand::Unregister {
                user_id: client.user_id,
                conn_id: client.id,
                reply,
            })
            .await
            .unwrap_or(false);
        client.close();
        removed
    }

    /// Non-blocking delivery to the recipient's live connection.
    ///
    /// Never touches storage. A recipient whose queue is full is evicted.
    pub async fn deliver(&self, event: &Event) -> DeliveryOutcome {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(event_id = %event.id, error = %e, "Failed to serialize event");
                return DeliveryOutcome::Offline;
            }
        };

        match self
            .request(|reply| HubCommand::Deliver {
                recipient: event.recipient_id,
                frame,
                reply,
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Delivery skipped");
                DeliveryOutcome::Offline
            }
        }
    }

    /// Deliver an event that did not come from the chat send path.
    ///
    /// Online recipients get it directly; otherwise it is stored for later
    /// pickup.
    pub async fn broadcast_event(&self, event: Event) -> AppResult<DeliveryOutcome> {
        let outcome = self.deliver(&event).await;
        if !outcome.is_delivered() {
            let location = self.events.store(&event).await?;
            self.metrics.event_stored(location);
        }
        Ok(outcome)
    }

    /// Number of registered connections.
    pub async fn online_count(&self) -> usize {
        self.request(|reply| HubCommand::OnlineCount { reply })
            .await
            .unwrap_or(0)
    }

    /// Whether a connection is registered for `user_id`.
    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.request(|reply| HubCommand::IsOnline { user_id, reply })
            .await
            .unwrap_or(false)
    }

    /// Close every connection and stop the coordinator.
    pub async fn shutdown(&self) {
        if let Err(e) = self.request(|reply| HubCommand::Shutdown { reply }).await {
            warn!(error = %e, "Hub already stopped");
        }
    }
}
