//! Shared test fixtures
//!
//! Builds an in-memory application state with known users and groups,
//! serves it on an ephemeral port, and provides WebSocket client helpers.

// Each integration test binary compiles this module and uses a subset of it.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use kastina::backend::chat::store::{MemoryMembershipStore, MemoryMessageStore};
use kastina::backend::middleware::{StaticAuthResolver, UserIdentity};
use kastina::backend::routes::create_router;
use kastina::backend::server::config::ChatConfig;
use kastina::backend::server::state::AppState;
use kastina::shared::Group;

/// Token accepted for the test user "alice"
pub const ALICE_TOKEN: &str = "tok-alice";
/// Token accepted for the test user "bob"
pub const BOB_TOKEN: &str = "tok-bob";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build an in-memory state with alice/bob registered and "Team Alpha" seeded
pub fn build_state(
    config: ChatConfig,
) -> (AppState, Arc<MemoryMembershipStore>, Arc<MemoryMessageStore>) {
    let alice = UserIdentity {
        user_id: Uuid::new_v4(),
        username: "alice".to_string(),
    };
    let bob = UserIdentity {
        user_id: Uuid::new_v4(),
        username: "bob".to_string(),
    };
    let auth = StaticAuthResolver::deny_all()
        .with_user(ALICE_TOKEN, alice)
        .with_user(BOB_TOKEN, bob);

    let (state, memberships, messages) = AppState::in_memory(Arc::new(auth), config);
    memberships.add_group(Group::new("Team Alpha", "integration test group"));
    (state, memberships, messages)
}

/// Serve the state on an ephemeral local port
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Open a WebSocket connection to the server
pub async fn connect(addr: SocketAddr, path_and_query: &str) -> WsClient {
    let url = format!("ws://{}{}", addr, path_and_query);
    let (client, _response) = connect_async(url.as_str()).await.expect("websocket handshake");
    client
}

/// Attempt a connection, returning the HTTP status on a refused handshake
pub async fn connect_expect_refusal(addr: SocketAddr, path_and_query: &str) -> u16 {
    let url = format!("ws://{}{}", addr, path_and_query);
    match connect_async(url.as_str()).await {
        Ok(_) => panic!("handshake unexpectedly succeeded for {}", path_and_query),
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => response.status().as_u16(),
        Err(other) => panic!("unexpected handshake error: {:?}", other),
    }
}

/// Receive the next text frame as JSON, with a timeout
pub async fn recv_json(client: &mut WsClient) -> serde_json::Value {
    let deadline = Duration::from_secs(5);
    loop {
        let frame = tokio::time::timeout(deadline, client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("connection closed while waiting for frame")
            .expect("transport error while waiting for frame");
        match frame {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("frame is not valid JSON")
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {:?}", other),
        }
    }
}

/// Receive the close frame, returning its code
pub async fn recv_close_code(client: &mut WsClient) -> u16 {
    let deadline = Duration::from_secs(5);
    loop {
        let frame = tokio::time::timeout(deadline, client.next())
            .await
            .expect("timed out waiting for close")
            .expect("connection ended without a close frame")
            .expect("transport error while waiting for close");
        match frame {
            Message::Close(Some(frame)) => return frame.code.into(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected close frame, got: {:?}", other),
        }
    }
}

/// Send a JSON value as one text frame
pub async fn send_json(client: &mut WsClient, value: serde_json::Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .expect("send frame");
}
