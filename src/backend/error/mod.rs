//! Backend Error Module
//!
//! Error taxonomy of the realtime core and its mapping onto WebSocket
//! close frames.

/// Error types
pub mod types;

pub use types::{ChatError, CLOSE_AUTH_FAILURE, CLOSE_GROUP_NOT_FOUND, CLOSE_INTERNAL_ERROR};
