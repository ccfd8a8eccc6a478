//! The coordinator task that owns the online map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use quikchat_core::types::{ConnectionId, UserId};

use crate::connection::ClientHandle;
use crate::metrics::RealtimeMetrics;

use super::command::{DeliveryOutcome, HubCommand};

/// Exclusive owner of `user -> connection`.
///
/// Nothing outside this task touches the map; everything arrives as a
/// [`HubCommand`] and is handled to completion before the next one.
pub(crate) struct Registry {
    commands: mpsc::Receiver<HubCommand>,
    clients: HashMap<UserId, Arc<ClientHandle>>,
    metrics: Arc<RealtimeMetrics>,
}

impl Registry {
    pub(crate) fn new(commands: mpsc::Receiver<HubCommand>, metrics: Arc<RealtimeMetrics>) -> Self {
        Self {
            commands,
            clients: HashMap::new(),
            metrics,
        }
    }

    /// Process commands until shutdown or until every hub handle is gone.
    pub(crate) async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register { client, reply } => {
                    self.register(client);
                    let _ = reply.send(());
                }
                HubCommand::Unregister {
                    user_id,
                    conn_id,
                    reply,
                } => {
                    let _ = reply.send(self.unregister(user_id, conn_id));
                }
                HubCommand::Deliver {
                    recipient,
                    frame,
                    reply,
                } => {
                    let _ = reply.send(self.deliver(recipient, frame));
                }
                HubCommand::OnlineCount { reply } => {
                    let _ = reply.send(self.clients.len());
                }
                HubCommand::IsOnline { user_id, reply } => {
                    let _ = reply.send(self.clients.contains_key(&user_id));
                }
                HubCommand::Shutdown { reply } => {
                    self.close_all();
                    let _ = reply.send(());
                    break;
                }
            }
        }

        self.close_all();
        debug!("Hub coordinator stopped");
    }

    fn register(&mut self, client: Arc<ClientHandle>) {
        let conn_id = client.id;
        let user_id = client.user_id;

        if let Some(previous) = self.clients.insert(user_id, client) {
            previous.close();
            self.metrics.connection_replaced();
            self.metrics.connection_closed();
            info!(
                conn_id = %previous.id,
                user_id = %user_id,
                replaced_by = %conn_id,
                "Closed previous connection for user"
            );
        }

        self.metrics.connection_opened();
        info!(conn_id = %conn_id, user_id = %user_id, "Connection registered");
    }

    fn unregister(&mut self, user_id: UserId, conn_id: ConnectionId) -> bool {
        match self.clients.get(&user_id) {
            Some(current) if current.id == conn_id => {}
            _ => return false,
        }

        if let Some(client) = self.clients.remove(&user_id) {
            client.close();
            self.metrics.connection_closed();
            info!(conn_id = %conn_id, user_id = %user_id, "Connection unregistered");
            return true;
        }
        false
    }

    fn deliver(&mut self, recipient: UserId, frame: String) -> DeliveryOutcome {
        let Some(client) = self.clients.get(&recipient) else {
            return DeliveryOutcome::Offline;
        };

        match client.try_enqueue(frame) {
            Ok(()) => {
                self.metrics.event_delivered();
                DeliveryOutcome::Delivered
            }
            Err(reason) => {
                warn!(
                    conn_id = %client.id,
                    user_id = %recipient,
                    reason = %reason,
                    "Evicting connection that cannot accept frames"
                );
                if let Some(client) = self.clients.remove(&recipient) {
                    client.close();
                }
                self.metrics.connection_evicted();
                self.metrics.connection_closed();
                DeliveryOutcome::Evicted
            }
        }
    }

    fn close_all(&mut self) {
        if self.clients.is_empty() {
            return;
        }
        let count = self.clients.len();
        for (_, client) in self.clients.drain() {
            client.close();
            self.metrics.connection_closed();
        }
        info!(count = count, "All connections closed");
    }
}
