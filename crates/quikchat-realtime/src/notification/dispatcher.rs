//! Notification dispatcher: a bounded work queue drained by a fixed pool.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use quikchat_core::config::realtime::NotificationConfig;
use quikchat_core::error::AppError;
use quikchat_core::result::AppResult;
use quikchat_core::types::{GroupId, UserId};

use crate::hub::Hub;

use super::builder::NotificationBuilder;
use super::types::Notification;

/// Routes friend and group notifications through the hub.
///
/// Submissions wait when the queue is full, so a burst of domain actions
/// slows its producers instead of growing memory.
#[derive(Clone)]
pub struct NotificationDispatcher {
    queue: mpsc::Sender<Notification>,
    builder: NotificationBuilder,
    hub: Hub,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("workers", &self.tracker.len())
            .finish()
    }
}

impl NotificationDispatcher {
    /// Create the dispatcher and start its workers.
    pub fn start(config: &NotificationConfig, builder: NotificationBuilder, hub: Hub) -> Self {
        let (queue, rx) = mpsc::channel(config.queue_capacity.max(1));
        let dispatcher = Self {
            queue,
            builder,
            hub,
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        };

        let rx = Arc::new(Mutex::new(rx));
        let workers = config.workers.max(1);
        for worker in 0..workers {
            let this = dispatcher.clone();
            let rx = rx.clone();
            dispatcher.tracker.spawn(async move { this.work(worker, rx).await });
        }
        dispatcher.tracker.close();

        info!(workers = workers, "Notification dispatcher started");
        dispatcher
    }

    async fn work(self, worker: usize, rx: Arc<Mutex<mpsc::Receiver<Notification>>>) {
        loop {
            let next = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                next = async { rx.lock().await.recv().await } => next,
            };
            let Some(notification) = next else { break };

            if let Err(e) = self.handle(&notification).await {
                warn!(worker = worker, error = %e, ?notification, "Notification dropped");
            }
        }
        debug!(worker = worker, "Notification worker stopped");
    }

    /// Build and route one notification now. Returns the number of events
    /// produced.
    pub async fn handle(&self, notification: &Notification) -> AppResult<usize> {
        let events = self.builder.build(notification).await?;
        let count = events.len();

        for event in events {
            let event_id = event.id;
            let recipient = event.recipient_id;
            if let Err(e) = self.hub.broadcast_event(event).await {
                error!(
                    event_id = %event_id,
                    user_id = %recipient,
                    error = %e,
                    "Failed to deliver or store notification"
                );
            }
        }

        self.hub.metrics().notification_dispatched();
        Ok(count)
    }

    /// Queue a notification for the workers.
    pub async fn submit(&self, notification: Notification) -> AppResult<()> {
        if self.shutdown.is_cancelled() {
            return Err(AppError::service_unavailable("Notification dispatcher stopped"));
        }
        self.queue
            .send(notification)
            .await
            .map_err(|_| AppError::service_unavailable("Notification dispatcher stopped"))
    }

    /// `from` sent `to` a friend request.
    pub async fn friend_request_received(&self, from: UserId, to: UserId) -> AppResult<()> {
        self.submit(Notification::FriendRequestReceived { from, to })
            .await
    }

    /// `by` accepted `requester`'s friend request.
    pub async fn friend_request_accepted(&self, by: UserId, requester: UserId) -> AppResult<()> {
        self.submit(Notification::FriendRequestAccepted { by, requester })
            .await
    }

    /// `by` rejected `requester`'s friend request.
    pub async fn friend_request_rejected(&self, by: UserId, requester: UserId) -> AppResult<()> {
        self.submit(Notification::FriendRequestRejected { by, requester })
            .await
    }

    /// `by` unfriended `friend`.
    pub async fn unfriended(&self, by: UserId, friend: UserId) -> AppResult<()> {
        self.submit(Notification::Unfriended { by, friend }).await
    }

    /// `adder` added `member` to `group`.
    pub async fn added_to_group(&self, group: GroupId, member: UserId, adder: UserId) -> AppResult<()> {
        self.submit(Notification::AddedToGroup {
            group,
            member,
            adder,
        })
        .await
    }

    /// `remover` removed `member` from `group`.
    pub async fn removed_from_group(
        &self,
        group: GroupId,
        member: UserId,
        remover: UserId,
    ) -> AppResult<()> {
        self.submit(Notification::RemovedFromGroup {
            group,
            member,
            remover,
        })
        .await
    }

    /// `user` joined `group`.
    pub async fn user_joined_group(&self, group: GroupId, user: UserId) -> AppResult<()> {
        self.submit(Notification::UserJoinedGroup { group, user })
            .await
    }

    /// `user` left `group`.
    pub async fn user_left_group(&self, group: GroupId, user: UserId) -> AppResult<()> {
        self.submit(Notification::UserLeftGroup { group, user })
            .await
    }

    /// Stop the workers. Queued notifications that were not picked up are
    /// dropped.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.wait().await;
        info!("Notification dispatcher stopped");
    }
}
