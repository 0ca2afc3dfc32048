/**
 * Wire-Level Chat Frames
 *
 * This module defines the JSON frames exchanged over a chat or notification
 * connection. Each WebSocket text frame carries exactly one of these objects.
 *
 * # Inbound
 *
 * Clients send `{ "message": "...", "is_typing": true }` with either field
 * optional. A frame with non-empty text is a chat message; a frame with only
 * the typing flag is a typing indicator; a frame with neither is ignored.
 *
 * # Outbound
 *
 * Outbound events are serialized without a type discriminator, so the wire
 * carries plain objects:
 * - `chat_message`: `{ message, user, profile_picture, is_typing, timestamp }`
 * - `user_typing`: `{ user, is_typing }`
 * - `user_join_leave`: `{ message, total_members }`
 */
use serde::{Deserialize, Serialize};

/// Inbound frame on a chat connection
///
/// Unknown fields are ignored so newer clients can send extra data without
/// breaking older servers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundChatFrame {
    /// Chat message text, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Typing indicator flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_typing: Option<bool>,
}

impl InboundChatFrame {
    /// Returns the message text if this frame carries a non-empty message
    pub fn chat_text(&self) -> Option<&str> {
        self.message.as_deref().filter(|text| !text.is_empty())
    }

    /// Returns true if this frame is a bare typing indicator
    pub fn is_typing_only(&self) -> bool {
        self.chat_text().is_none() && self.is_typing == Some(true)
    }
}

/// Outbound event broadcast to the members of a group
///
/// Serialized untagged: the variant is implied by the fields present,
/// matching what chat clients expect on the wire.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChatEvent {
    /// A chat message relayed to the group
    Message {
        message: String,
        user: String,
        profile_picture: String,
        is_typing: bool,
        timestamp: String,
    },
    /// A member is typing
    Typing { user: String, is_typing: bool },
    /// A member joined or left; carries the updated live member count
    Presence { message: String, total_members: usize },
}

impl ChatEvent {
    /// Create a chat message event with a server-assigned timestamp
    pub fn message(
        message: impl Into<String>,
        user: impl Into<String>,
        profile_picture: impl Into<String>,
    ) -> Self {
        Self::Message {
            message: message.into(),
            user: user.into(),
            profile_picture: profile_picture.into(),
            is_typing: false,
            timestamp: now_timestamp(),
        }
    }

    /// Create a typing indicator event
    pub fn typing(user: impl Into<String>) -> Self {
        Self::Typing {
            user: user.into(),
            is_typing: true,
        }
    }

    /// Create a join presence event
    pub fn join(user: &str, total_members: usize) -> Self {
        Self::Presence {
            message: format!("{} has joined the group.", user),
            total_members,
        }
    }

    /// Create a leave presence event
    pub fn leave(user: &str, total_members: usize) -> Self {
        Self::Presence {
            message: format!("{} has left the group.", user),
            total_members,
        }
    }
}

/// Frame exchanged on the global notification channel
///
/// Inbound frames are echoed verbatim to every subscriber, the sender
/// included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationFrame {
    /// Notification body
    pub message: String,
}

/// Get the current timestamp as an RFC3339 string
fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inbound_frame_with_message() {
        let frame: InboundChatFrame = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(frame.chat_text(), Some("hi"));
        assert!(!frame.is_typing_only());
    }

    #[test]
    fn test_inbound_frame_typing_only() {
        let frame: InboundChatFrame = serde_json::from_str(r#"{"is_typing":true}"#).unwrap();
        assert_eq!(frame.chat_text(), None);
        assert!(frame.is_typing_only());
    }

    #[test]
    fn test_inbound_frame_empty_message_is_not_chat_text() {
        let frame: InboundChatFrame =
            serde_json::from_str(r#"{"message":"","is_typing":true}"#).unwrap();
        assert_eq!(frame.chat_text(), None);
        assert!(frame.is_typing_only());
    }

    #[test]
    fn test_inbound_frame_ignores_unknown_fields() {
        let frame: InboundChatFrame =
            serde_json::from_str(r#"{"message":"hi","extra":42}"#).unwrap();
        assert_eq!(frame.chat_text(), Some("hi"));
    }

    #[test]
    fn test_inbound_frame_empty_object() {
        let frame: InboundChatFrame = serde_json::from_str("{}").unwrap();
        assert_eq!(frame.chat_text(), None);
        assert!(!frame.is_typing_only());
    }

    #[test]
    fn test_message_event_wire_shape() {
        let event = ChatEvent::message("hello", "alice", "http://host/media/p.png");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["message"], "hello");
        assert_eq!(json["user"], "alice");
        assert_eq!(json["profile_picture"], "http://host/media/p.png");
        assert_eq!(json["is_typing"], false);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_typing_event_wire_shape() {
        let event = ChatEvent::typing("bob");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["user"], "bob");
        assert_eq!(json["is_typing"], true);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_presence_event_wire_shape() {
        let event = ChatEvent::join("alice", 2);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["message"], "alice has joined the group.");
        assert_eq!(json["total_members"], 2);

        let event = ChatEvent::leave("bob", 1);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["message"], "bob has left the group.");
        assert_eq!(json["total_members"], 1);
    }

    #[test]
    fn test_notification_frame_round_trip() {
        let frame = NotificationFrame {
            message: "site maintenance at noon".to_string(),
        };
        let json = serde_json::to_string(&frame).unwrap();
        let parsed: NotificationFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, frame);
    }
}
