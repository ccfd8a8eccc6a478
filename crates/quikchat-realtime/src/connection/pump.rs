//! Read and write loops for one connection.
//!
//! Both loops are generic over a [`Frame`] stream and sink so the HTTP
//! layer can plug in its socket and tests can plug in channels. Either loop
//! ending unregisters the connection, which closes the queue and cancels the
//! other loop.

use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::hub::Hub;

use super::frame::Frame;
use super::handle::ClientHandle;
use super::heartbeat::Heartbeat;

/// Feed inbound frames to the hub until the peer leaves or the connection
/// is closed.
pub async fn read_loop<S, E>(hub: Hub, client: Arc<ClientHandle>, mut inbound: S)
where
    S: Stream<Item = Result<Frame, E>> + Unpin,
    E: Display,
{
    let shutdown = client.shutdown_token();

    loop {
        let next = tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(conn_id = %client.id, "Read loop cancelled");
                break;
            }
            next = inbound.next() => next,
        };

        match next {
            Some(Ok(Frame::Text(text))) => {
                client.touch();
                hub.dispatch(&client, &text).await;
            }
            Some(Ok(Frame::Ping(_) | Frame::Pong(_))) => client.touch(),
            Some(Ok(Frame::Close)) | None => {
                debug!(conn_id = %client.id, "Peer closed connection");
                break;
            }
            Some(Err(e)) => {
                warn!(conn_id = %client.id, error = %e, "Read error");
                break;
            }
        }
    }

    hub.unregister(&client).await;
}

/// Drain the outbound queue onto the sink and keep the peer alive with
/// pings. Ends when the queue is closed, a write fails, or the peer stops
/// answering.
pub async fn write_loop<K>(
    hub: Hub,
    client: Arc<ClientHandle>,
    mut outbound: mpsc::Receiver<String>,
    mut sink: K,
    heartbeat: Heartbeat,
) where
    K: Sink<Frame> + Unpin,
    K::Error: Display,
{
    let mut ticker = time::interval_at(
        Instant::now() + heartbeat.ping_interval,
        heartbeat.ping_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Frame::Text(text)).await {
                        warn!(conn_id = %client.id, error = %e, "Write error");
                        break;
                    }
                }
                None => {
                    debug!(conn_id = %client.id, "Outbound queue closed");
                    break;
                }
            },
            _ = ticker.tick() => {
                if heartbeat.is_expired(&client) {
                    warn!(
                        conn_id = %client.id,
                        idle_ms = client.idle_for().as_millis() as u64,
                        "Heartbeat timeout"
                    );
                    break;
                }
                if let Err(e) = sink.send(Frame::Ping(Bytes::new())).await {
                    warn!(conn_id = %client.id, error = %e, "Ping failed");
                    break;
                }
            }
        }
    }

    let _ = sink.send(Frame::Close).await;
    let _ = sink.close().await;
    hub.unregister(&client).await;
}
