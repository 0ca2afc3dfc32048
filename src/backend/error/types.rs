/**
 * Backend Error Types
 *
 * This module defines the error taxonomy of the realtime core. Every
 * failure is scoped to a single connection or a single publish attempt;
 * nothing here is fatal to the process.
 *
 * # Error Categories
 *
 * - `AuthFailure` - no or invalid identity; the connection is refused
 * - `GroupNotFound` - join target absent; surfaced as a close reason
 * - `MalformedFrame` - unparsable inbound payload; logged and dropped,
 *   the connection stays open
 * - `PersistenceFailure` - storage unavailable; an already-issued
 *   broadcast still completes
 * - `DeliveryFailure` - one recipient unreachable during a publish;
 *   skipped without aborting the batch
 */

use thiserror::Error;

use crate::backend::chat::store::StoreError;

/// Close code for a refused authentication (application range)
pub const CLOSE_AUTH_FAILURE: u16 = 4401;
/// Close code for a join against an unknown group (application range)
pub const CLOSE_GROUP_NOT_FOUND: u16 = 4404;
/// Close code for an internal server failure
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Errors raised by the realtime core
#[derive(Debug, Error)]
pub enum ChatError {
    /// No valid identity for the connection
    #[error("Authentication failure: {reason}")]
    AuthFailure {
        /// Human-readable refusal reason
        reason: String,
    },

    /// The join target does not exist
    #[error("Group not found: {group}")]
    GroupNotFound {
        /// Routing-key form of the requested group
        group: String,
    },

    /// Inbound payload could not be parsed
    #[error("Malformed frame: {detail}")]
    MalformedFrame {
        /// Parse failure detail
        detail: String,
    },

    /// Storage was unavailable for a membership or message write
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] StoreError),

    /// One recipient could not be reached during a publish
    #[error("Delivery failure to {connection}")]
    DeliveryFailure {
        /// Display form of the unreachable connection ID
        connection: String,
    },
}

impl ChatError {
    /// Create an authentication failure
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::AuthFailure {
            reason: reason.into(),
        }
    }

    /// Create a group-not-found failure
    pub fn group_not_found(group: impl Into<String>) -> Self {
        Self::GroupNotFound {
            group: group.into(),
        }
    }

    /// Create a malformed-frame failure
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedFrame {
            detail: detail.into(),
        }
    }

    /// WebSocket close code used when this error refuses a connection
    ///
    /// Only errors that terminate a session are ever sent as close frames;
    /// `MalformedFrame` and `DeliveryFailure` are handled in place and the
    /// mapping for them is the generic internal code.
    pub fn close_code(&self) -> u16 {
        match self {
            Self::AuthFailure { .. } => CLOSE_AUTH_FAILURE,
            Self::GroupNotFound { .. } => CLOSE_GROUP_NOT_FOUND,
            Self::MalformedFrame { .. }
            | Self::PersistenceFailure(_)
            | Self::DeliveryFailure { .. } => CLOSE_INTERNAL_ERROR,
        }
    }

    /// Short close reason sent alongside the close code
    pub fn close_reason(&self) -> String {
        match self {
            Self::AuthFailure { .. } => "unauthorized".to_string(),
            Self::GroupNotFound { group } => format!("group '{}' not found", group),
            Self::MalformedFrame { .. } => "malformed frame".to_string(),
            Self::PersistenceFailure(_) => "storage unavailable".to_string(),
            Self::DeliveryFailure { .. } => "delivery failed".to_string(),
        }
    }
}
