//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

use quikchat_api::probe::{BufferProbe, HealthProbe};
use quikchat_api::{AppState, build_app};
use quikchat_auth::{JwtAuthenticator, JwtEncoder};
use quikchat_cache::memory::MemoryEventBuffer;
use quikchat_core::config::app::CorsConfig;
use quikchat_core::config::auth::AuthConfig;
use quikchat_core::config::realtime::RealtimeConfig;
use quikchat_core::traits::EventBuffer;
use quikchat_core::types::UserProfile;
use quikchat_realtime::RealtimeEngine;
use quikchat_service::EventService;
use quikchat_service::testing::{InMemoryEventStore, InMemoryGroupDirectory, InMemoryUserDirectory};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A running server plus handles on everything behind it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub engine: RealtimeEngine,
    pub buffer: Arc<MemoryEventBuffer>,
    pub store: Arc<InMemoryEventStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub groups: Arc<InMemoryGroupDirectory>,
    encoder: JwtEncoder,
    server: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_realtime(RealtimeConfig::default()).await
    }

    pub async fn with_realtime(realtime: RealtimeConfig) -> Self {
        let auth = AuthConfig {
            jwt_secret: "integration-secret".to_string(),
            issuer: String::new(),
            access_ttl_minutes: 15,
            leeway_seconds: 0,
        };

        let buffer = Arc::new(MemoryEventBuffer::new(Duration::from_secs(3600)));
        let store = Arc::new(InMemoryEventStore::default());
        let users = Arc::new(InMemoryUserDirectory::default());
        let groups = Arc::new(InMemoryGroupDirectory::default());
        let events = EventService::new(buffer.clone(), store.clone());
        let engine = RealtimeEngine::new(realtime, events.clone(), users.clone(), groups.clone());

        let as_buffer: Arc<dyn EventBuffer> = buffer.clone();
        let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(BufferProbe(as_buffer))];
        let state = AppState::new(
            Arc::new(JwtAuthenticator::new(&auth)),
            events,
            engine.clone(),
            probes,
        );
        let app = build_app(state, &CorsConfig::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            engine,
            buffer,
            store,
            users,
            groups,
            encoder: JwtEncoder::new(&auth),
            server,
        }
    }

    pub fn token(&self, user: &UserProfile) -> String {
        self.encoder
            .access_token(user.id.into_uuid(), Some(&user.username))
            .unwrap()
    }

    pub fn ws_url(&self, token: &str) -> String {
        format!("ws://{}/ws?token={}", self.addr, token)
    }

    /// Connect as `user` and wait until the hub has registered them.
    pub async fn connect(&self, user: &UserProfile) -> Client {
        let before = self.engine.online_count().await;
        let (ws, _) = connect_async(self.ws_url(&self.token(user))).await.unwrap();
        self.wait_online(before + 1).await;
        Client { ws }
    }

    pub async fn wait_online(&self, expected: usize) {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while self.engine.online_count().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("online count never reached expected value");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// A connected WebSocket client speaking JSON envelopes.
pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Client {
    pub fn from_stream(ws: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self { ws }
    }

    pub async fn send_json(&mut self, value: Value) {
        self.ws
            .send(Message::text(value.to_string()))
            .await
            .unwrap();
    }

    pub async fn send_message(&mut self, to: Uuid, content: &str) {
        self.send_json(json!({
            "type": "message_sent",
            "payload": { "content": content, "recipientId": to }
        }))
        .await;
    }

    pub async fn ack(&mut self, event_id: &Value) {
        self.send_json(json!({
            "type": "event_ack",
            "payload": { "eventId": event_id }
        }))
        .await;
    }

    /// Next text frame as JSON; control frames are skipped.
    pub async fn next_json(&mut self) -> Value {
        let next = tokio::time::timeout(RECV_TIMEOUT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return serde_json::from_str::<Value>(text.as_str()).unwrap();
                    }
                    Some(Ok(Message::Close(_))) | None => panic!("connection closed"),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => panic!("websocket error: {e}"),
                }
            }
        })
        .await;
        next.expect("timed out waiting for a frame")
    }

    /// Assert nothing arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(Some(Ok(Message::Text(text)))) = tokio::time::timeout(window, self.ws.next()).await {
            panic!("unexpected frame: {text}");
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
