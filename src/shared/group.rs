/**
 * Chat Group Model and Routing-Key Sanitization
 *
 * This module defines the chat group data structure and the sanitization
 * rule that turns a human-readable group name into a routing key.
 *
 * # Routing Keys
 *
 * The Connection Registry and Broadcast Router address groups by routing
 * key, never by display name. A routing key is derived from the group name
 * by replacing every character that is not ASCII alphanumeric with an
 * underscore. The original name is kept separately for display.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sanitize a group name into its routing-key form
///
/// Every character that is not ASCII alphanumeric is replaced with an
/// underscore. The transformation is deterministic and idempotent:
/// sanitizing an already-sanitized name returns it unchanged.
///
/// # Example
///
/// ```rust
/// use kastina::shared::group::sanitize_group_name;
///
/// assert_eq!(sanitize_group_name("Team Alpha"), "Team_Alpha");
/// assert_eq!(sanitize_group_name("Team_Alpha"), "Team_Alpha");
/// ```
pub fn sanitize_group_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// A chat group
///
/// `name` is always the sanitized routing-key form; `display_name` keeps
/// the human-readable original. Membership is tracked separately (a durable
/// user-to-group relation in the membership store, plus the live connection
/// set in the Connection Registry).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    /// Group ID
    pub id: Uuid,
    /// Sanitized routing-key form of the name
    pub name: String,
    /// Human-readable name as originally supplied
    pub display_name: Option<String>,
    /// Group description
    pub description: String,
}

impl Group {
    /// Create a new group from a human-readable name
    ///
    /// The routing-key form is derived here; the original name is retained
    /// as the display name.
    pub fn new(display_name: impl Into<String>, description: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            id: Uuid::new_v4(),
            name: sanitize_group_name(&display_name),
            display_name: Some(display_name),
            description: description.into(),
        }
    }
}
