//! Shared Module
//!
//! This module contains types and data structures that are not tied to the
//! server internals: the wire-level frames exchanged with clients, the chat
//! group model with its routing-key sanitization, and shared error types.
//!
//! # Overview
//!
//! All types here are plain serializable data. The server consumes them from
//! `backend`; test code and client tooling can use them directly.

/// Wire-level chat and notification frames
pub mod event;

/// Chat group model and routing-key sanitization
pub mod group;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use error::SharedError;
pub use event::{ChatEvent, InboundChatFrame, NotificationFrame};
pub use group::{sanitize_group_name, Group};
