//! Integration tests for friend and group notifications.

use std::time::Duration;

use crate::helpers::TestServer;

#[tokio::test]
async fn test_friend_request_reaches_online_user() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");
    let mut b = server.connect(&bob).await;

    server
        .engine
        .notifications
        .friend_request_received(alice.id, bob.id)
        .await
        .unwrap();

    let received = b.next_json().await;
    assert_eq!(received["type"], "friend_request_received");
    assert_eq!(received["payload"]["username"], "alice");
    assert_eq!(received["senderId"], alice.id.to_string());
}

#[tokio::test]
async fn test_group_removal_notifies_member_and_the_rest() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");
    let carol = server.users.add("carol");
    let group = server.groups.add("Climbers", &[alice.id, carol.id]);

    let mut b = server.connect(&bob).await;
    let mut c = server.connect(&carol).await;

    // bob was already removed from the member list by the caller.
    server
        .engine
        .notifications
        .removed_from_group(group.id, bob.id, alice.id)
        .await
        .unwrap();

    let direct = b.next_json().await;
    assert_eq!(direct["type"], "removed_from_group");
    assert_eq!(direct["payload"]["groupName"], "Climbers");
    assert_eq!(direct["payload"]["removerId"], alice.id.to_string());

    let left = c.next_json().await;
    assert_eq!(left["type"], "user_left_group");
    assert_eq!(left["payload"]["userId"], bob.id.to_string());
    c.expect_silence(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_offline_notification_waits_in_buffer() {
    let server = TestServer::start().await;
    let alice = server.users.add("alice");
    let bob = server.users.add("bob");

    server
        .engine
        .notifications
        .unfriended(alice.id, bob.id)
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while server.engine.metrics.snapshot().notifications_dispatched == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("notification should be processed");

    let mut b = server.connect(&bob).await;
    let replayed = b.next_json().await;
    assert_eq!(replayed["type"], "unfriended");
    assert_eq!(replayed["payload"]["username"], "alice");
}
