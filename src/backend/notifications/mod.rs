//! Notifications Module
//!
//! The global broadcast channel: every connected client shares one routing
//! key and every published frame reaches all of them. Simpler than group
//! chat - no membership, no persistence, pure subscribe/publish.

/// Notification session handler
pub mod session;

pub use session::{notification_ws_handler, run_notification_session, NOTIFICATIONS_ROUTING_KEY};
