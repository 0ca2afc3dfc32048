//! Route Configuration Module
//!
//! Assembles the WebSocket endpoints, health probe, and static media
//! serving into the application router.

/// Router assembly
pub mod router;

pub use router::create_router;
