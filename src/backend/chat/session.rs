/**
 * Chat Session Handler
 *
 * This module drives the per-connection protocol state machine for group
 * chat: Connecting -> Authorized -> Joined -> Active -> Closed.
 *
 * # Session Flow
 *
 * 1. **Authorized**: the route handler resolved the connection's identity
 *    before upgrading; anonymous sockets never reach this module.
 * 2. **Joined**: the requested group name is sanitized into its routing
 *    key, the group is resolved (or implicitly created when configured),
 *    the durable membership is ensured, the connection registers with the
 *    Connection Registry, and a join presence event goes out with the
 *    updated live member count.
 * 3. **Active**: each inbound frame either relays a chat message (persist,
 *    then broadcast), relays a typing indicator (broadcast only), or is
 *    ignored. Malformed frames are logged and dropped without closing the
 *    connection.
 * 4. **Closed**: on any exit - client close, transport error - the registry
 *    entry is released (guard-scoped, so abnormal paths are covered too)
 *    and a leave presence event announces the decremented count. The
 *    durable membership record is retained across disconnects.
 *
 * # Concurrency
 *
 * Each connection runs as its own task. Outbound frames flow through the
 * unbounded queue registered with the Connection Registry and are drained
 * into the socket by a dedicated pump task, so a slow socket never stalls
 * a broadcast.
 */

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::backend::error::ChatError;
use crate::backend::middleware::UserIdentity;
use crate::backend::registry::{ConnectionId, RegistrationGuard};
use crate::backend::server::state::AppState;
use crate::shared::{sanitize_group_name, ChatEvent, Group, InboundChatFrame};

use super::store::NewChatMessage;

/// Run a chat session on an upgraded, authenticated socket
///
/// `requested_group` is the group name exactly as supplied in the URL; the
/// routing key is derived here.
pub async fn run_chat_session(
    socket: WebSocket,
    state: AppState,
    user: UserIdentity,
    requested_group: String,
) {
    let routing_key = sanitize_group_name(&requested_group);

    // Authorized -> Joined. Refusals close the socket before any registry
    // entry exists.
    let group = match join_group(&state, &user, &requested_group, &routing_key).await {
        Ok(group) => group,
        Err(e) => {
            tracing::warn!(
                "[Chat] Join refused for {} on '{}': {}",
                user.username,
                routing_key,
                e
            );
            close_with(socket, &e).await;
            return;
        }
    };
    tracing::debug!(
        "[Chat] {} resolved group '{}' (display name {:?})",
        user.username,
        routing_key,
        group.display_name
    );

    let (mut sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let connection_id = ConnectionId::generate();

    // Outbound pump: drains the registry-facing queue into the socket.
    // It ends on its own once the guard below drops the last sender.
    let mut outbound = UnboundedReceiverStream::new(rx).map(|frame| Ok(Message::Text(frame.into())));
    tokio::spawn(async move {
        let _ = sink.send_all(&mut outbound).await;
    });

    let guard = RegistrationGuard::register(
        state.registry.clone(),
        routing_key.clone(),
        connection_id,
        tx,
    );

    let online = state.registry.member_count(&routing_key);
    state
        .broadcaster
        .publish(&routing_key, &ChatEvent::join(&user.username, online));
    tracing::info!(
        "[Chat] {} joined '{}' as {} ({} online)",
        user.username,
        routing_key,
        connection_id,
        online
    );

    // Active: relay frames until the peer goes away.
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                handle_frame(&state, &user, &routing_key, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            // Binary and ping/pong frames are not part of the protocol.
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("[Chat] {} transport error: {:?}", connection_id, e);
                break;
            }
        }
    }

    // Active -> Closed: release the registry entry first so the leave
    // event already reflects the decremented count.
    drop(guard);
    let online = state.registry.member_count(&routing_key);
    state
        .broadcaster
        .publish(&routing_key, &ChatEvent::leave(&user.username, online));
    tracing::info!(
        "[Chat] {} left '{}' ({} online)",
        user.username,
        routing_key,
        online
    );
}

/// Resolve the target group and ensure the durable membership
///
/// An unknown group is a refusal unless implicit creation is enabled in
/// the chat configuration.
async fn join_group(
    state: &AppState,
    user: &UserIdentity,
    requested_group: &str,
    routing_key: &str,
) -> Result<Group, ChatError> {
    let group = match state.memberships.resolve_group(routing_key).await? {
        Some(group) => group,
        None if state.config.auto_create_groups => {
            let group = Group::new(requested_group, "");
            state.memberships.create_group(&group).await?;
            tracing::info!("[Chat] Implicitly created group '{}'", routing_key);
            group
        }
        None => return Err(ChatError::group_not_found(routing_key)),
    };

    state
        .memberships
        .ensure_membership(user.user_id, routing_key)
        .await?;
    Ok(group)
}

/// Handle one inbound text frame while the session is Active
async fn handle_frame(state: &AppState, user: &UserIdentity, routing_key: &str, text: &str) {
    let frame: InboundChatFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(
                "[Chat] Dropping frame from {}: {}",
                user.username,
                ChatError::malformed(e.to_string())
            );
            return;
        }
    };

    if let Some(content) = frame.chat_text() {
        let message = NewChatMessage {
            user_id: user.user_id,
            group_name: routing_key.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        // Persist first, broadcast regardless: a storage failure is logged
        // against the sender but must not silence the group.
        if let Err(e) = state.messages.save(message).await {
            tracing::error!(
                "[Chat] Failed to persist message from {} in '{}': {}",
                user.username,
                routing_key,
                e
            );
        }

        let profile_picture = state.profiles.profile_picture_url(user.user_id).await;
        state.broadcaster.publish(
            routing_key,
            &ChatEvent::message(content, user.username.as_str(), profile_picture),
        );
    } else if frame.is_typing_only() {
        state
            .broadcaster
            .publish(routing_key, &ChatEvent::typing(user.username.as_str()));
    } else {
        tracing::debug!("[Chat] Ignoring empty frame from {}", user.username);
    }
}

/// Refuse a connection with a close frame derived from the error
pub(crate) async fn close_with(mut socket: WebSocket, error: &ChatError) {
    let frame = CloseFrame {
        code: error.close_code(),
        reason: error.close_reason().into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("[Chat] Failed to send close frame: {:?}", e);
    }
}
