/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP
 * server: state creation, database loading, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Create the Connection Registry and Broadcast Router
 * 2. Load the chat configuration from the environment
 * 3. Load optional services (database)
 * 4. Wire the persistence collaborators and the connection authenticator
 * 5. Create and configure the router
 *
 * # Degraded Operation
 *
 * Without a database the server stays up on the in-memory stores: the
 * notification channel works fully, while chat connections are refused
 * because no authenticator can vouch for them.
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::chat::db::{PgMembershipStore, PgMessageStore, PgProfileResolver};
use crate::backend::middleware::{AuthResolver, JwtAuthResolver, StaticAuthResolver};
use crate::backend::registry::{BroadcastRouter, ConnectionRegistry};
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ChatConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// This function sets up the server with:
/// - The realtime fan-out pair (registry + router)
/// - Database-backed stores when `DATABASE_URL` is configured, in-memory
///   stores otherwise
/// - The JWT connection authenticator when `JWT_SECRET` is configured
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing kastina realtime backend");

    // Step 1: the fan-out pair. Constructed here, injected everywhere.
    let registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = BroadcastRouter::new(registry.clone());

    // Step 2: chat policy knobs
    let config = ChatConfig::from_env();
    tracing::info!(
        "Chat config: auto_create_groups={}, notifications_require_auth={}",
        config.auto_create_groups,
        config.notifications_require_auth
    );

    // Step 3: optional services
    let db_pool = load_database().await;

    // Step 4: persistence collaborators and authenticator
    let app_state = match db_pool {
        Some(pool) => {
            let auth: Arc<dyn AuthResolver> = match JwtAuthResolver::from_env(pool.clone()) {
                Some(resolver) => Arc::new(resolver),
                None => Arc::new(StaticAuthResolver::deny_all()),
            };
            AppState {
                registry,
                broadcaster,
                memberships: Arc::new(PgMembershipStore::new(pool.clone())),
                messages: Arc::new(PgMessageStore::new(pool.clone())),
                profiles: Arc::new(PgProfileResolver::new(
                    pool,
                    config.media_base_url.clone(),
                )),
                auth,
                config,
            }
        }
        None => {
            // No database means no user records to authenticate against;
            // chat joins will be refused but notifications stay open.
            use crate::backend::chat::store::{
                MemoryMembershipStore, MemoryMessageStore, StaticProfileResolver,
            };
            AppState {
                registry,
                broadcaster,
                memberships: Arc::new(MemoryMembershipStore::new()),
                messages: Arc::new(MemoryMessageStore::new()),
                profiles: Arc::new(StaticProfileResolver::new(format!(
                    "{}/profile_picture/default.png",
                    config.media_base_url.trim_end_matches('/')
                ))),
                auth: Arc::new(StaticAuthResolver::deny_all()),
                config,
            }
        }
    };

    tracing::info!("Connection registry and broadcast router initialized");

    // Step 5: routes
    create_router(app_state)
}
