//! Middleware Module
//!
//! Connection-level request processing: resolving the handshake of an
//! inbound WebSocket connection to a user identity.

/// Connection authentication
pub mod auth;

pub use auth::{token_from_query, AuthResolver, JwtAuthResolver, StaticAuthResolver, UserIdentity};
