//! Group chat integration tests
//!
//! Drives real WebSocket connections against a server running on the
//! in-memory stores and checks the full join/message/typing/leave flow.

mod common;

use common::*;
use futures_util::SinkExt;
use kastina::backend::chat::MembershipStore;
use kastina::backend::server::config::ChatConfig;
use serde_json::json;

#[tokio::test]
async fn test_join_message_and_leave_flow() {
    let (state, _memberships, messages) = build_state(ChatConfig::default());
    let addr = spawn_server(state).await;

    // Alice joins "Team Alpha" (routing key Team_Alpha) and sees her own
    // join event with the live member count.
    let mut alice = connect(addr, &format!("/ws/chat/Team%20Alpha?token={}", ALICE_TOKEN)).await;
    let joined = recv_json(&mut alice).await;
    assert_eq!(joined["message"], "alice has joined the group.");
    assert_eq!(joined["total_members"], 1);

    // Bob joins; both connections observe the new count.
    let mut bob = connect(addr, &format!("/ws/chat/Team%20Alpha?token={}", BOB_TOKEN)).await;
    let bob_joined = recv_json(&mut bob).await;
    assert_eq!(bob_joined["total_members"], 2);
    let alice_sees_join = recv_json(&mut alice).await;
    assert_eq!(alice_sees_join["message"], "bob has joined the group.");
    assert_eq!(alice_sees_join["total_members"], 2);

    // Alice sends a message; both members receive it and exactly one row
    // is persisted.
    send_json(&mut alice, json!({"message": "hi"})).await;
    for client in [&mut alice, &mut bob] {
        let frame = recv_json(client).await;
        assert_eq!(frame["message"], "hi");
        assert_eq!(frame["user"], "alice");
        assert_eq!(frame["is_typing"], false);
        assert!(frame["profile_picture"]
            .as_str()
            .unwrap()
            .contains("profile_picture"));
        assert!(frame["timestamp"].is_string());
    }
    let saved = messages.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].content, "hi");
    assert_eq!(saved[0].group_name, "Team_Alpha");

    // Bob disconnects; alice sees the leave event with the reduced count.
    bob.close(None).await.expect("close bob");
    let left = recv_json(&mut alice).await;
    assert_eq!(left["message"], "bob has left the group.");
    assert_eq!(left["total_members"], 1);
}

#[tokio::test]
async fn test_typing_indicator_is_broadcast_not_persisted() {
    let (state, _memberships, messages) = build_state(ChatConfig::default());
    let addr = spawn_server(state).await;

    let mut alice = connect(addr, &format!("/ws/chat/Team%20Alpha?token={}", ALICE_TOKEN)).await;
    recv_json(&mut alice).await; // alice's join
    let mut bob = connect(addr, &format!("/ws/chat/Team%20Alpha?token={}", BOB_TOKEN)).await;
    recv_json(&mut bob).await; // bob's join
    recv_json(&mut alice).await; // bob's join as seen by alice

    send_json(&mut alice, json!({"is_typing": true})).await;

    let frame = recv_json(&mut bob).await;
    assert_eq!(frame["user"], "alice");
    assert_eq!(frame["is_typing"], true);
    assert!(frame.get("message").is_none());
    assert!(messages.saved().is_empty());
}

#[tokio::test]
async fn test_anonymous_connection_is_refused_before_any_mutation() {
    let (state, memberships, messages) = build_state(ChatConfig::default());
    let registry = state.registry.clone();
    let addr = spawn_server(state).await;

    let status = connect_expect_refusal(addr, "/ws/chat/Team%20Alpha").await;
    assert_eq!(status, 401);

    let status = connect_expect_refusal(addr, "/ws/chat/Team%20Alpha?token=bogus").await;
    assert_eq!(status, 401);

    assert_eq!(registry.routing_key_count(), 0);
    assert_eq!(memberships.membership_count(), 0);
    assert!(messages.saved().is_empty());
}

#[tokio::test]
async fn test_unknown_group_is_refused_with_close_reason() {
    let (state, memberships, _messages) = build_state(ChatConfig::default());
    let addr = spawn_server(state).await;

    let mut client = connect(addr, &format!("/ws/chat/No%20Such%20Group?token={}", ALICE_TOKEN)).await;
    let code = recv_close_code(&mut client).await;
    assert_eq!(code, 4404);
    assert_eq!(memberships.membership_count(), 0);
}

#[tokio::test]
async fn test_unknown_group_is_created_when_configured() {
    let config = ChatConfig {
        auto_create_groups: true,
        ..ChatConfig::default()
    };
    let (state, memberships, _messages) = build_state(config);
    let addr = spawn_server(state).await;

    let mut client = connect(addr, &format!("/ws/chat/Fresh%20Group?token={}", ALICE_TOKEN)).await;
    let joined = recv_json(&mut client).await;
    assert_eq!(joined["total_members"], 1);

    let group = memberships
        .resolve_group("Fresh_Group")
        .await
        .unwrap()
        .expect("group implicitly created");
    assert_eq!(group.display_name.as_deref(), Some("Fresh Group"));
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let (state, _memberships, messages) = build_state(ChatConfig::default());
    let addr = spawn_server(state).await;

    let mut alice = connect(addr, &format!("/ws/chat/Team%20Alpha?token={}", ALICE_TOKEN)).await;
    recv_json(&mut alice).await; // join

    alice
        .send(tokio_tungstenite::tungstenite::Message::Text(
            "this is not json".into(),
        ))
        .await
        .expect("send garbage");

    // The connection survives and keeps relaying.
    send_json(&mut alice, serde_json::json!({"message": "still here"})).await;
    let frame = recv_json(&mut alice).await;
    assert_eq!(frame["message"], "still here");
    assert_eq!(messages.saved().len(), 1);
}

#[tokio::test]
async fn test_membership_is_retained_across_reconnects() {
    let (state, memberships, _messages) = build_state(ChatConfig::default());
    let addr = spawn_server(state).await;

    let mut alice = connect(addr, &format!("/ws/chat/Team%20Alpha?token={}", ALICE_TOKEN)).await;
    recv_json(&mut alice).await;
    assert_eq!(memberships.membership_count(), 1);

    alice.close(None).await.expect("close alice");
    // The live connection goes away but the durable membership stays.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(memberships.membership_count(), 1);

    // Rejoining is idempotent.
    let mut alice = connect(addr, &format!("/ws/chat/Team%20Alpha?token={}", ALICE_TOKEN)).await;
    recv_json(&mut alice).await;
    assert_eq!(memberships.membership_count(), 1);
}
