//! Router Configuration
//!
//! This module provides the main router creation function that combines
//! all route configurations into a single Axum router.
//!
//! # Routes
//!
//! - `GET /ws/chat/{group_name}` - group chat WebSocket
//! - `GET /ws/notifications` - global notification WebSocket
//! - `GET /health` - liveness probe
//! - `/media/*` - static media files (profile pictures)
//!
//! Unknown routes fall through to a plain 404 handler.

use axum::Router;
use tower_http::services::ServeDir;

use crate::backend::chat::handlers::chat_ws_handler;
use crate::backend::notifications::session::notification_ws_handler;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing the realtime core and its
///   collaborators
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route(
            "/ws/chat/{group_name}",
            axum::routing::get(chat_ws_handler),
        )
        .route(
            "/ws/notifications",
            axum::routing::get(notification_ws_handler),
        )
        .route("/health", axum::routing::get(|| async { "ok" }));

    // Profile pictures referenced by chat_message events
    let router = router.nest_service("/media", ServeDir::new("media"));

    // Fallback handler for 404
    let router = router.fallback(|| async { "404 Not Found" });

    router.with_state(app_state)
}
