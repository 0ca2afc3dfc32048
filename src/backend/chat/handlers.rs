/**
 * Chat WebSocket Route Handler
 *
 * This module implements the upgrade handler for `GET /ws/chat/{group_name}`.
 * The connection's identity is resolved from the `?token=` query parameter
 * before the upgrade; anonymous connections are refused with
 * `401 Unauthorized` and never touch the registry or the stores.
 */

use axum::{
    extract::{Path, RawQuery, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::middleware::token_from_query;
use crate::backend::server::state::AppState;

use super::session::run_chat_session;

/// Handle a chat connection (GET /ws/chat/{group_name})
///
/// # Query Parameters
///
/// - `token` - Bearer token identifying the connecting user
///
/// # Errors
///
/// * `401 Unauthorized` - missing, invalid or unknown token
///
/// A resolvable identity upgrades the socket and hands it to the chat
/// session state machine; group resolution failures surface later as a
/// close frame.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    Path(group_name): Path<String>,
    RawQuery(raw_query): RawQuery,
    State(state): State<AppState>,
) -> Response {
    let token = token_from_query(raw_query.as_deref());

    match state.auth.authenticate(token.as_deref()).await {
        Some(user) => {
            tracing::debug!("[Chat] {} authorized for '{}'", user.username, group_name);
            ws.on_upgrade(move |socket| run_chat_session(socket, state, user, group_name))
        }
        None => {
            tracing::warn!("[Chat] Anonymous connection for '{}' refused", group_name);
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
