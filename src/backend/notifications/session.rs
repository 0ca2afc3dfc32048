/**
 * Notification Session Handler
 *
 * This module implements the global broadcast channel: a two-state
 * (Connected -> Closed) session over the fixed `notifications_group`
 * routing key. Every inbound `{ "message": ... }` frame is echoed verbatim
 * to all current subscribers, the sender included; nothing is persisted
 * and no membership is involved.
 *
 * Anonymous access is allowed by default. Deployments that want the
 * channel restricted set `NOTIFICATIONS_REQUIRE_AUTH`, which refuses
 * anonymous sockets the same way the chat endpoint does.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket},
        RawQuery, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::backend::error::ChatError;
use crate::backend::middleware::token_from_query;
use crate::backend::registry::{ConnectionId, RegistrationGuard};
use crate::backend::server::state::AppState;
use crate::shared::NotificationFrame;

/// Routing key shared by every notification subscriber
pub const NOTIFICATIONS_ROUTING_KEY: &str = "notifications_group";

/// Handle a notification connection (GET /ws/notifications)
///
/// # Errors
///
/// * `401 Unauthorized` - anonymous connection while
///   `NOTIFICATIONS_REQUIRE_AUTH` is enabled
pub async fn notification_ws_handler(
    ws: WebSocketUpgrade,
    RawQuery(raw_query): RawQuery,
    State(state): State<AppState>,
) -> Response {
    if state.config.notifications_require_auth {
        let token = token_from_query(raw_query.as_deref());
        if state.auth.authenticate(token.as_deref()).await.is_none() {
            tracing::warn!("[Notify] Anonymous subscriber refused");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    ws.on_upgrade(move |socket| run_notification_session(socket, state))
}

/// Run a notification session on an upgraded socket
pub async fn run_notification_session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let connection_id = ConnectionId::generate();

    let mut outbound = UnboundedReceiverStream::new(rx).map(|frame| Ok(Message::Text(frame.into())));
    tokio::spawn(async move {
        let _ = sink.send_all(&mut outbound).await;
    });

    let guard = RegistrationGuard::register(
        state.registry.clone(),
        NOTIFICATIONS_ROUTING_KEY,
        connection_id,
        tx,
    );
    tracing::info!(
        "[Notify] {} subscribed ({} online)",
        connection_id,
        state.registry.member_count(NOTIFICATIONS_ROUTING_KEY)
    );

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_notification_frame(&state, connection_id, text.as_str());
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("[Notify] {} transport error: {:?}", connection_id, e);
                break;
            }
        }
    }

    drop(guard);
    tracing::info!("[Notify] {} unsubscribed", connection_id);
}

/// Echo one inbound notification frame to every subscriber
fn handle_notification_frame(state: &AppState, connection_id: ConnectionId, text: &str) {
    let frame: NotificationFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(
                "[Notify] Dropping frame from {}: {}",
                connection_id,
                ChatError::malformed(e.to_string())
            );
            return;
        }
    };

    // No sender de-duplication: the publisher hears its own notification.
    state
        .broadcaster
        .publish(NOTIFICATIONS_ROUTING_KEY, &frame);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::middleware::StaticAuthResolver;
    use crate::backend::server::config::ChatConfig;
    use crate::backend::server::state::AppState;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let (state, _, _) = AppState::in_memory(
            Arc::new(StaticAuthResolver::deny_all()),
            ChatConfig::default(),
        );
        state
    }

    fn subscribe(state: &AppState) -> tokio::sync::mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        state
            .registry
            .register(NOTIFICATIONS_ROUTING_KEY, ConnectionId::generate(), tx);
        rx
    }

    #[tokio::test]
    async fn test_notification_is_echoed_to_all_subscribers() {
        let state = test_state();
        let mut rx_a = subscribe(&state);
        let mut rx_b = subscribe(&state);

        handle_notification_frame(&state, ConnectionId::generate(), r#"{"message":"ping"}"#);

        for rx in [&mut rx_a, &mut rx_b] {
            let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(frame["message"], "ping");
        }
    }

    #[tokio::test]
    async fn test_malformed_notification_is_dropped() {
        let state = test_state();
        let mut rx = subscribe(&state);

        handle_notification_frame(&state, ConnectionId::generate(), "nonsense");
        handle_notification_frame(&state, ConnectionId::generate(), r#"{"wrong":"shape"}"#);

        assert!(rx.try_recv().is_err());
    }
}
