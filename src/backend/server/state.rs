/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the `FromRef` projections for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` is the central state container: the Connection Registry and
 * Broadcast Router (the realtime fan-out pair), the persistence
 * collaborators behind their trait objects, the connection authenticator,
 * and the chat policy configuration. Everything is constructed once in
 * `create_app` and injected here - no component reaches for a global.
 *
 * # Thread Safety
 *
 * All fields are cheap to clone and safe to share: `Arc`-wrapped
 * registry/stores, a `Clone` router handle, and plain config data.
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::chat::store::{
    MembershipStore, MemoryMembershipStore, MemoryMessageStore, MessageStore, ProfileResolver,
    StaticProfileResolver,
};
use crate::backend::middleware::AuthResolver;
use crate::backend::registry::{BroadcastRouter, ConnectionRegistry};
use crate::backend::server::config::ChatConfig;

/// Application state shared by every connection handler
#[derive(Clone)]
pub struct AppState {
    /// Live connection registry (routing key -> connection set)
    pub registry: Arc<ConnectionRegistry>,

    /// Broadcast router fanning events out over the registry
    pub broadcaster: BroadcastRouter,

    /// Durable user-to-group membership store
    pub memberships: Arc<dyn MembershipStore>,

    /// Durable chat message store
    pub messages: Arc<dyn MessageStore>,

    /// Profile picture lookup for chat_message enrichment
    pub profiles: Arc<dyn ProfileResolver>,

    /// Connection authenticator
    pub auth: Arc<dyn AuthResolver>,

    /// Chat policy configuration
    pub config: ChatConfig,
}

impl AppState {
    /// Build a state backed entirely by the in-memory stores
    ///
    /// Used when the server runs without a database and by tests. The
    /// concrete store handles are returned alongside so callers can seed
    /// groups and inspect saved messages.
    pub fn in_memory(
        auth: Arc<dyn AuthResolver>,
        config: ChatConfig,
    ) -> (Self, Arc<MemoryMembershipStore>, Arc<MemoryMessageStore>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = BroadcastRouter::new(registry.clone());
        let memberships = Arc::new(MemoryMembershipStore::new());
        let messages = Arc::new(MemoryMessageStore::new());
        let profiles = Arc::new(StaticProfileResolver::new(format!(
            "{}/profile_picture/default.png",
            config.media_base_url.trim_end_matches('/')
        )));

        let state = Self {
            registry,
            broadcaster,
            memberships: memberships.clone(),
            messages: messages.clone(),
            profiles,
            auth,
            config,
        };
        (state, memberships, messages)
    }
}

/// Allow handlers to extract the registry directly from `AppState`
impl FromRef<AppState> for Arc<ConnectionRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

/// Allow handlers to extract the broadcast router directly from `AppState`
impl FromRef<AppState> for BroadcastRouter {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.broadcaster.clone()
    }
}

/// Allow handlers to extract the chat configuration directly from `AppState`
impl FromRef<AppState> for ChatConfig {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
