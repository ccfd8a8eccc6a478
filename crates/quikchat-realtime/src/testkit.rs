//! Shared wiring for this crate's unit tests.

use std::sync::Arc;

use tokio::sync::mpsc;

use quikchat_core::config::realtime::RealtimeConfig;
use quikchat_core::events::Event;
use quikchat_core::traits::EventBuffer;
use quikchat_core::types::{AuthenticatedUser, UserId};
use quikchat_service::EventService;
use quikchat_service::testing::{
    InMemoryEventStore, InMemoryGroupDirectory, InMemoryUserDirectory, MemoryEventBuffer,
    UnavailableBuffer,
};

use crate::connection::ClientHandle;
use crate::hub::Hub;
use crate::metrics::RealtimeMetrics;

pub(crate) struct Fixture {
    pub hub: Hub,
    pub events: EventService,
    pub buffer: Arc<MemoryEventBuffer>,
    pub store: Arc<InMemoryEventStore>,
    pub groups: Arc<InMemoryGroupDirectory>,
    pub users: Arc<InMemoryUserDirectory>,
    pub metrics: Arc<RealtimeMetrics>,
    pub config: RealtimeConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RealtimeConfig::default())
    }

    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self::with_config(RealtimeConfig {
            outbound_queue_capacity: capacity,
            ..RealtimeConfig::default()
        })
    }

    /// Both stores refuse writes.
    pub fn unavailable() -> Self {
        let store = Arc::new(InMemoryEventStore::default());
        store.set_unavailable(true);
        Self::assemble(
            RealtimeConfig::default(),
            Arc::default(),
            Arc::new(UnavailableBuffer),
            store,
        )
    }

    /// Writes go to `buffer` and `store`; `self.buffer` stays empty.
    pub fn with_stores(buffer: Arc<dyn EventBuffer>, store: Arc<InMemoryEventStore>) -> Self {
        Self::assemble(RealtimeConfig::default(), Arc::default(), buffer, store)
    }

    pub fn with_config(config: RealtimeConfig) -> Self {
        let buffer = Arc::new(MemoryEventBuffer::default());
        Self::assemble(config, buffer.clone(), buffer, Arc::default())
    }

    fn assemble(
        config: RealtimeConfig,
        buffer: Arc<MemoryEventBuffer>,
        active_buffer: Arc<dyn EventBuffer>,
        store: Arc<InMemoryEventStore>,
    ) -> Self {
        let events = EventService::new(active_buffer, store.clone());
        let groups = Arc::new(InMemoryGroupDirectory::default());
        let users = Arc::new(InMemoryUserDirectory::default());
        let metrics = Arc::new(RealtimeMetrics::new());
        let (hub, _task) = Hub::spawn(&config, events.clone(), groups.clone(), metrics.clone());
        Self {
            hub,
            events,
            buffer,
            store,
            groups,
            users,
            metrics,
            config,
        }
    }

    pub async fn connect(&self, username: &str) -> (Arc<ClientHandle>, mpsc::Receiver<String>) {
        self.connect_as(UserId::new(), username).await
    }

    pub async fn connect_as(
        &self,
        user_id: UserId,
        username: &str,
    ) -> (Arc<ClientHandle>, mpsc::Receiver<String>) {
        let (client, rx) = ClientHandle::new(
            &AuthenticatedUser {
                user_id,
                username: Some(username.to_string()),
            },
            self.config.outbound_queue_capacity,
        );
        self.hub.register(client.clone()).await.expect("register");
        (client, rx)
    }
}

pub(crate) fn parse(raw: &str) -> Event {
    Event::from_json(raw).expect("valid event frame")
}
