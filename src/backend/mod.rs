//! Backend Module
//!
//! This module contains all server-side code for the kastina realtime
//! backend: the WebSocket chat core, the global notification channel, and
//! the plumbing around them.
//!
//! # Overview
//!
//! The backend module includes:
//! - Axum HTTP server setup and configuration
//! - Connection Registry and Broadcast Router (the fan-out pair)
//! - Per-connection chat and notification session handlers
//! - Connection authentication glue
//! - Database persistence (PostgreSQL) behind injectable traits
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`registry`** - Connection registry and broadcast router
//! - **`chat`** - Chat session state machine, stores, route handler
//! - **`notifications`** - Global broadcast channel
//! - **`middleware`** - Connection authentication
//! - **`error`** - Backend-specific error types
//!
//! # State Management
//!
//! Shared state (`AppState`) carries the registry, the router, and the
//! persistence collaborators behind trait objects. Everything is
//! constructed once at startup and injected; per-key connection state is
//! the only frequently-mutated structure, and all of its mutation is
//! atomic with respect to concurrent publishes.
//!
//! # Error Handling
//!
//! Failures are scoped to a single connection or a single publish attempt:
//! refused connections get a close frame, malformed frames are dropped,
//! storage errors are logged without silencing the group. Nothing here
//! takes the process down.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Connection registry and broadcast router
pub mod registry;

/// Chat session handling and persistence
pub mod chat;

/// Global notification channel
pub mod notifications;

/// Connection authentication middleware
pub mod middleware;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use chat::handlers::chat_ws_handler;
pub use error::ChatError;
pub use notifications::session::notification_ws_handler;
pub use registry::{BroadcastRouter, ConnectionId, ConnectionRegistry};
pub use server::{create_app, AppState, ChatConfig};
