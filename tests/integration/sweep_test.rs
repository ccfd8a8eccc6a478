//! Integration tests for the buffer-to-durable reconciliation sweep.

use std::sync::Arc;

use quikchat_core::config::worker::WorkerConfig;
use quikchat_core::traits::EventBuffer;
use quikchat_worker::BufferSweep;

use crate::helpers::TestServer;

#[tokio::test]
async fn test_swept_events_still_replay_from_durable_store() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");

    let mut a = server.connect(&alice).await;
    a.send_message(bob.id.into_uuid(), "first").await;
    a.next_json().await;
    a.send_message(bob.id.into_uuid(), "second").await;
    a.next_json().await;
    assert_eq!(server.buffer.len().await.unwrap(), 2);

    let sweep = BufferSweep::new(
        server.buffer.clone(),
        server.store.clone(),
        &WorkerConfig::default(),
    );
    let report = sweep.tick().await.unwrap().expect("no tick in flight");
    assert_eq!(report.migrated, 2);
    assert_eq!(server.buffer.len().await.unwrap(), 0);
    assert_eq!(server.store.count(), 2);

    let mut b = server.connect(&bob).await;
    let first = b.next_json().await;
    let second = b.next_json().await;
    assert_eq!(first["payload"]["content"], "first");
    assert_eq!(second["payload"]["content"], "second");

    b.ack(&first["id"]).await;
    b.ack(&second["id"]).await;
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while server.store.count() != 0 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("acks should delete the durable rows");
}

#[tokio::test]
async fn test_sweep_on_empty_buffer_is_a_no_op() {
    let server = TestServer::start().await;
    let buffer: Arc<dyn EventBuffer> = server.buffer.clone();
    let sweep = BufferSweep::new(buffer, server.store.clone(), &WorkerConfig::default());

    let report = sweep.tick().await.unwrap().expect("no tick in flight");
    assert_eq!(report.scanned, 0);
    assert_eq!(server.store.count(), 0);
}
