//! Integration tests for WebSocket connection and messaging.

use std::time::Duration;

use tokio_tungstenite::connect_async;

use quikchat_core::config::realtime::RealtimeConfig;
use quikchat_core::traits::EventBuffer;

use crate::helpers::TestServer;

#[tokio::test]
async fn test_ws_upgrade_with_bad_token_is_refused() {
    let server = TestServer::start().await;
    let result = connect_async(server.ws_url("not-a-jwt")).await;
    assert!(result.is_err());
    assert_eq!(server.engine.online_count().await, 0);
}

#[tokio::test]
async fn test_direct_message_between_online_users() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");
    let mut a = server.connect(&alice).await;
    let mut b = server.connect(&bob).await;

    a.send_message(bob.id.into_uuid(), "  hello bob  ").await;

    let received = b.next_json().await;
    assert_eq!(received["type"], "message_sent");
    assert_eq!(received["payload"]["content"], "hello bob");
    assert_eq!(received["payload"]["senderId"], alice.id.to_string());
    assert_eq!(received["recipientId"], bob.id.to_string());

    let ack = a.next_json().await;
    assert_eq!(ack["type"], "message_ack");
    assert_eq!(ack["payload"]["messageId"], received["payload"]["id"]);
    assert!(ack["payload"].get("failedRecipients").is_none());

    // Delivered but unconfirmed: still pending until bob acks it.
    assert_eq!(server.buffer.len().await.unwrap(), 1);
    b.ack(&received["id"]).await;
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.buffer.len().await.unwrap() != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("ack should clear the buffered copy");
}

#[tokio::test]
async fn test_offline_recipient_gets_replay_on_connect() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");
    let mut a = server.connect(&alice).await;

    a.send_message(bob.id.into_uuid(), "are you there?").await;
    let ack = a.next_json().await;
    assert_eq!(ack["type"], "message_ack");

    let mut b = server.connect(&bob).await;
    let replayed = b.next_json().await;
    assert_eq!(replayed["type"], "message_sent");
    assert_eq!(replayed["payload"]["content"], "are you there?");
    assert_eq!(replayed["payload"]["id"], ack["payload"]["messageId"]);
}

#[tokio::test]
async fn test_group_message_fans_out_to_other_members() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");
    let carol = server.users.add("carol");
    let group = server.groups.add("Climbers", &[alice.id, bob.id, carol.id]);

    let mut a = server.connect(&alice).await;
    let mut b = server.connect(&bob).await;
    let mut c = server.connect(&carol).await;

    a.send_message(group.id.into_uuid(), "belay check").await;

    for client in [&mut b, &mut c] {
        let received = client.next_json().await;
        assert_eq!(received["type"], "message_sent");
        assert_eq!(received["payload"]["recipientId"], group.id.to_string());
    }

    let ack = a.next_json().await;
    assert_eq!(ack["type"], "message_ack");
    a.expect_silence(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_invalid_content_is_dropped_without_closing() {
    let config = RealtimeConfig {
        max_content_length: 10,
        ..RealtimeConfig::default()
    };
    let server = TestServer::with_realtime(config).await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");
    let mut a = server.connect(&alice).await;
    let mut b = server.connect(&bob).await;

    a.send_message(bob.id.into_uuid(), "   ").await;
    a.send_message(bob.id.into_uuid(), "this is far too long").await;
    a.send_json(serde_json::json!({ "type": "typing", "payload": {} })).await;
    b.expect_silence(Duration::from_millis(200)).await;

    // The connection survives bad input.
    a.send_message(bob.id.into_uuid(), "short").await;
    assert_eq!(b.next_json().await["payload"]["content"], "short");
}

#[tokio::test]
async fn test_second_login_replaces_first() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");
    let first = server.connect(&alice).await;

    let (second, _) = connect_async(server.ws_url(&server.token(&alice))).await.unwrap();
    let mut second = crate::helpers::Client::from_stream(second);
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.engine.metrics.snapshot().connections_replaced == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("second login should replace the first");
    assert_eq!(server.engine.online_count().await, 1);

    let mut b = server.connect(&bob).await;
    b.send_message(alice.id.into_uuid(), "which one are you?").await;
    assert_eq!(
        second.next_json().await["payload"]["content"],
        "which one are you?"
    );
    first.close().await;
}
