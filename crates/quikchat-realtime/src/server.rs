//! Top-level real-time engine that ties together all subsystems.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, Stream};
use tokio::time;
use tracing::{debug, info, warn};

use quikchat_core::config::realtime::RealtimeConfig;
use quikchat_core::result::AppResult;
use quikchat_core::traits::{GroupDirectory, UserDirectory};
use quikchat_core::types::AuthenticatedUser;
use quikchat_service::EventService;

use crate::connection::pump::{read_loop, write_loop};
use crate::connection::{ClientHandle, Frame, Heartbeat};
use crate::hub::Hub;
use crate::metrics::RealtimeMetrics;
use crate::notification::{NotificationBuilder, NotificationDispatcher};

/// How long the write loop may take to flush after the read side ends.
const WRITER_GRACE: Duration = Duration::from_secs(5);

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection registry and router.
    pub hub: Hub,
    /// Friend and group notifications.
    pub notifications: NotificationDispatcher,
    /// Metrics collector.
    pub metrics: Arc<RealtimeMetrics>,
    events: EventService,
    config: RealtimeConfig,
    heartbeat: Heartbeat,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine and starts its background tasks.
    pub fn new(
        config: RealtimeConfig,
        events: EventService,
        users: Arc<dyn UserDirectory>,
        groups: Arc<dyn GroupDirectory>,
    ) -> Self {
        let metrics = Arc::new(RealtimeMetrics::new());
        let (hub, _coordinator) = Hub::spawn(&config, events.clone(), groups.clone(), metrics.clone());
        let notifications = NotificationDispatcher::start(
            &config.notifications,
            NotificationBuilder::new(users, groups),
            hub.clone(),
        );
        let heartbeat = Heartbeat::from_config(&config);

        info!(
            queue_capacity = config.outbound_queue_capacity,
            ping_interval_secs = heartbeat.ping_interval.as_secs(),
            "Real-time engine initialized"
        );

        Self {
            hub,
            notifications,
            metrics,
            events,
            config,
            heartbeat,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Run one authenticated connection to completion.
    ///
    /// Registers the client, starts its write loop, then reads until the
    /// peer leaves or the hub closes it. Undelivered events are replayed
    /// alongside the read loop.
    pub async fn serve<S, E, K>(&self, user: AuthenticatedUser, inbound: S, outbound: K) -> AppResult<()>
    where
        S: Stream<Item = Result<Frame, E>> + Unpin,
        E: Display,
        K: Sink<Frame> + Unpin + Send + 'static,
        K::Error: Display,
    {
        let (client, rx) = ClientHandle::new(&user, self.config.outbound_queue_capacity);
        self.hub.register(client.clone()).await?;

        let mut writer = tokio::spawn(write_loop(
            self.hub.clone(),
            client.clone(),
            rx,
            outbound,
            self.heartbeat,
        ));

        tokio::join!(
            self.replay(&client),
            read_loop(self.hub.clone(), client.clone(), inbound),
        );

        if time::timeout(WRITER_GRACE, &mut writer).await.is_err() {
            warn!(conn_id = %client.id, "Write loop did not finish, aborting");
            writer.abort();
        }

        info!(conn_id = %client.id, user_id = %client.user_id, "Connection finished");
        Ok(())
    }

    /// Push stored events the user has not confirmed yet.
    ///
    /// Waits for queue space instead of evicting, so a backlog larger than
    /// the outbound queue drains at the peer's pace. Stops when the
    /// connection closes or the peer stalls for a full liveness window.
    async fn replay(&self, client: &ClientHandle) -> usize {
        if self.config.replay_limit == 0 {
            return 0;
        }

        let pending = match self
            .events
            .fetch_undelivered(client.user_id, None, self.config.replay_limit)
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                warn!(user_id = %client.user_id, error = %e, "Replay fetch failed");
                return 0;
            }
        };

        let stall = self.config.liveness_window();
        let mut replayed = 0;
        for event in &pending {
            let frame = match event.to_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(event_id = %event.id, error = %e, "Skipping unencodable event");
                    continue;
                }
            };
            match time::timeout(stall, client.enqueue(frame)).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => break,
                Err(_) => {
                    warn!(
                        conn_id = %client.id,
                        remaining = pending.len() - replayed,
                        "Peer stalled during replay"
                    );
                    break;
                }
            }
            self.metrics.event_replayed();
            replayed += 1;
        }

        debug!(user_id = %client.user_id, replayed = replayed, "Replayed undelivered events");
        replayed
    }

    /// Number of connected users.
    pub async fn online_count(&self) -> usize {
        self.hub.online_count().await
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time engine");
        self.notifications.shutdown().await;
        self.hub.shutdown().await;
        info!("Real-time engine shut down");
    }
}
