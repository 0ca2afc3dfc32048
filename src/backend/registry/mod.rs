//! Realtime Fan-Out Module
//!
//! This module is the realtime core's delivery substrate: it tracks which
//! live connections belong to which routing key and fans published events
//! out to them.
//!
//! # Architecture
//!
//! - **`connection`** - Connection Registry: routing key -> live connection
//!   set, one outbound frame queue per connection
//! - **`router`** - Broadcast Router: serialize once, snapshot the member
//!   list, deliver to each member independently
//!
//! Both are explicitly constructed at startup and injected through
//! `AppState`; neither is a process global. Chat groups and the global
//! notification channel use the same machinery, differing only in routing
//! key.

/// Connection registry and per-connection frame queues
pub mod connection;

/// Broadcast router over the registry
pub mod router;

// Re-export commonly used types
pub use connection::{ConnectionId, ConnectionRegistry, FrameSender, RegistrationGuard};
pub use router::BroadcastRouter;
