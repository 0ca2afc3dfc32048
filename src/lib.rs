//! Kastina - Realtime Forum Chat Backend
//!
//! Kastina is the realtime messaging backend of a forum platform: group
//! chat over persistent WebSocket connections plus a global broadcast
//! notification channel.
//!
//! # Overview
//!
//! This library provides:
//! - Per-group chat with durable membership, message persistence, typing
//!   indicators and join/leave presence events
//! - A global notification channel every client can subscribe and publish to
//! - A connection registry / broadcast router pair that fans events out to
//!   live connections without cross-group interference
//!
//! # Module Structure
//!
//! The library is organized into two main modules:
//!
//! - **`shared`** - Wire-level frames, the group model with routing-key
//!   sanitization, and shared error types
//! - **`backend`** - The Axum server: session handlers, registry/router,
//!   persistence traits with PostgreSQL and in-memory backends
//!
//! # Usage
//!
//! ```rust,no_run
//! use kastina::backend::server::init::create_app;
//!
//! # async fn example() {
//! let app = create_app().await;
//! // Serve `app` with axum
//! # }
//! ```
//!
//! # Concurrency
//!
//! Each live connection runs as its own tokio task. The Connection
//! Registry is the only frequently-mutated shared structure; publishes
//! snapshot its per-key member list under a short lock and deliver over
//! per-connection queues, so one group's fan-out never blocks another's.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
