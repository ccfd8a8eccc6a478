//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use quikchat_core::types::{AuthenticatedUser, ConnectionId, UserId};

/// Why a frame could not be enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    /// The consumer is not keeping up.
    #[error("outbound queue full")]
    Full,
    /// The connection has already been closed.
    #[error("outbound queue closed")]
    Closed,
}

/// A handle to a single client connection.
///
/// The hub holds one per online user and pushes serialized frames into its
/// bounded outbound queue; the connection's write loop is the only reader.
#[derive(Debug)]
pub struct ClientHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// User who owns this connection
    pub user_id: UserId,
    /// Username from the token, when present
    pub username: Option<String>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    sender: Mutex<Option<mpsc::Sender<String>>>,
    shutdown: CancellationToken,
    opened: Instant,
    last_seen_ms: AtomicU64,
}

impl ClientHandle {
    /// Create a handle and the receiving end of its outbound queue.
    pub fn new(user: &AuthenticatedUser, capacity: usize) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Arc::new(Self {
            id: ConnectionId::new(),
            user_id: user.user_id,
            username: user.username.clone(),
            connected_at: Utc::now(),
            sender: Mutex::new(Some(tx)),
            shutdown: CancellationToken::new(),
            opened: Instant::now(),
            last_seen_ms: AtomicU64::new(0),
        });
        (handle, rx)
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::Sender<String>>> {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Non-blocking enqueue of a serialized frame.
    pub fn try_enqueue(&self, frame: String) -> Result<(), EnqueueError> {
        match self.sender().as_ref() {
            None => Err(EnqueueError::Closed),
            Some(tx) => tx.try_send(frame).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
                mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
            }),
        }
    }

    /// Enqueue a frame, waiting for queue space.
    ///
    /// Fails with [`EnqueueError::Closed`] once the connection is closed,
    /// including while waiting.
    pub async fn enqueue(&self, frame: String) -> Result<(), EnqueueError> {
        let tx = self.sender().clone();
        let Some(tx) = tx else {
            return Err(EnqueueError::Closed);
        };
        tokio::select! {
            _ = self.shutdown.cancelled() => Err(EnqueueError::Closed),
            sent = tx.send(frame) => sent.map_err(|_| EnqueueError::Closed),
        }
    }

    /// Close the outbound queue and signal both pumps to stop.
    ///
    /// Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        let closed = self.sender().take().is_some();
        self.shutdown.cancel();
        closed
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }

    /// Token cancelled when the connection is closed.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Record inbound activity from the peer.
    pub fn touch(&self) {
        let elapsed = self.opened.elapsed().as_millis() as u64;
        self.last_seen_ms.fetch_max(elapsed, Ordering::Relaxed);
    }

    /// Time since the peer was last heard from.
    pub fn idle_for(&self) -> Duration {
        let last_seen = Duration::from_millis(self.last_seen_ms.load(Ordering::Relaxed));
        self.opened.elapsed().saturating_sub(last_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new(),
            username: Some("ada".to_string()),
        }
    }

    #[tokio::test]
    async fn test_full_queue_reports_full() {
        let (handle, _rx) = ClientHandle::new(&user(), 1);
        assert!(handle.try_enqueue("a".to_string()).is_ok());
        assert_eq!(handle.try_enqueue("b".to_string()), Err(EnqueueError::Full));
    }

    #[tokio::test]
    async fn test_enqueue_waits_for_space() {
        let (handle, mut rx) = ClientHandle::new(&user(), 1);
        handle.enqueue("a".to_string()).await.unwrap();

        let waiting = tokio::spawn({
            let handle = handle.clone();
            async move { handle.enqueue("b".to_string()).await }
        });
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert_eq!(waiting.await.unwrap(), Ok(()));
        assert_eq!(rx.recv().await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_enqueue_gives_up_on_close() {
        let (handle, _rx) = ClientHandle::new(&user(), 1);
        handle.enqueue("a".to_string()).await.unwrap();

        let waiting = tokio::spawn({
            let handle = handle.clone();
            async move { handle.enqueue("b".to_string()).await }
        });
        tokio::task::yield_now().await;
        handle.close();
        assert_eq!(waiting.await.unwrap(), Err(EnqueueError::Closed));
    }

    #[tokio::test]
    async fn test_close_is_once() {
        let (handle, mut rx) = ClientHandle::new(&user(), 4);
        handle.try_enqueue("queued".to_string()).unwrap();

        assert!(handle.close());
        assert!(!handle.close());
        assert!(handle.is_closed());
        assert!(handle.shutdown_token().is_cancelled());
        assert_eq!(handle.try_enqueue("late".to_string()), Err(EnqueueError::Closed));

        // Frames queued before the close still drain.
        assert_eq!(rx.recv().await.as_deref(), Some("queued"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_resets_idle() {
        let (handle, _rx) = ClientHandle::new(&user(), 1);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(handle.idle_for() >= Duration::from_secs(5));
        handle.touch();
        assert!(handle.idle_for() < Duration::from_secs(1));
    }
}
