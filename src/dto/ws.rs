use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::validation::validate_chat_name,
    services::referee::{ChatEvent, ChatMessage},
    state::game::ChatUser,
};

/// Failure to decode a bridge frame.
#[derive(Debug, Error)]
pub enum BridgeDecodeError {
    /// Frame is not valid JSON for any known message.
    #[error("malformed bridge frame: {0}")]
    Json(#[from] serde_json::Error),
    /// Frame decoded but carries invalid fields.
    #[error("invalid bridge frame: {0}")]
    Invalid(#[from] ValidationErrors),
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from the chat bridge.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeInboundMessage {
    /// First frame of every connection.
    Identification {
        /// Shared secret, checked when the server has one configured.
        #[serde(default)]
        token: Option<String>,
        /// Chat id the bot posts under.
        bot_user_id: u64,
        /// Display name the bot posts under.
        bot_name: String,
    },
    /// A message was posted in the room.
    MessagePosted(ChatPayload),
    /// A message was edited.
    MessageEdited(ChatPayload),
    /// A message was deleted.
    MessageDeleted {
        /// Deleted message id.
        message_id: u64,
    },
    /// The star count of a message changed.
    StarsChanged {
        /// Starred message id.
        message_id: u64,
        /// New star count.
        stars: u32,
    },
}

impl BridgeInboundMessage {
    /// Decode and validate one text frame.
    pub fn from_json_str(text: &str) -> Result<Self, BridgeDecodeError> {
        let message: Self = serde_json::from_str(text)?;
        if let Self::MessagePosted(payload) | Self::MessageEdited(payload) = &message {
            payload.validate()?;
        }
        Ok(message)
    }

    /// Convert a room event into the referee's input, undoing the chat service's HTML escaping.
    pub fn into_chat_event(self) -> Option<ChatEvent> {
        match self {
            Self::Identification { .. } => None,
            Self::MessagePosted(payload) => Some(ChatEvent::Posted(payload.into())),
            Self::MessageEdited(payload) => Some(ChatEvent::Edited(payload.into())),
            Self::MessageDeleted { message_id } => Some(ChatEvent::Deleted(message_id)),
            Self::StarsChanged { message_id, stars } => Some(ChatEvent::StarsChanged {
                message: message_id,
                stars,
            }),
        }
    }
}

/// Chat message as relayed by the bridge.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct ChatPayload {
    pub message_id: u64,
    pub user_id: u64,
    #[validate(custom(function = "validate_chat_name"))]
    pub user_name: String,
    #[serde(default)]
    pub is_moderator: bool,
    /// Raw HTML-escaped content.
    #[validate(length(max = 20000))]
    pub content: String,
    #[serde(default)]
    pub stars: u32,
}

impl From<ChatPayload> for ChatMessage {
    fn from(payload: ChatPayload) -> Self {
        let mut user = ChatUser::new(payload.user_id, payload.user_name);
        user.is_moderator = payload.is_moderator;
        ChatMessage {
            id: payload.message_id,
            user,
            content: unescape_html(&payload.content),
            stars: payload.stars,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
/// Actions the bridge performs on the referee's behalf.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeOutboundMessage {
    /// Post a message.
    Send {
        text: String,
        /// When set, the bridge drops messages above the chat length ceiling.
        length_check: bool,
    },
    /// Toggle the star of a message.
    ToggleStar { message_id: u64 },
    /// Remove every star from a message.
    CancelStars { message_id: u64 },
    /// Pin or unpin a message.
    TogglePin { message_id: u64 },
}

/// Decode the HTML entities the chat service applies to message bodies.
pub fn unescape_html(input: &str) -> String {
    input
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posted_message_is_decoded_and_unescaped() {
        let frame = r#"{"type":"message_posted","message_id":5,"user_id":9,"user_name":"bob","content":"3: &lt;b&gt;fish &amp; chips&lt;/b&gt;","stars":1}"#;
        let message = BridgeInboundMessage::from_json_str(frame).unwrap();
        let Some(ChatEvent::Posted(chat)) = message.into_chat_event() else {
            panic!("expected a posted message");
        };
        assert_eq!(chat.content, "3: <b>fish & chips</b>");
        assert_eq!(chat.user.name, "bob");
        assert!(!chat.user.is_moderator);
        assert_eq!(chat.stars, 1);
    }

    #[test]
    fn blank_user_name_fails_validation() {
        let frame = r#"{"type":"message_posted","message_id":5,"user_id":9,"user_name":"  ","content":"hi"}"#;
        assert!(matches!(
            BridgeInboundMessage::from_json_str(frame),
            Err(BridgeDecodeError::Invalid(_))
        ));
    }

    #[test]
    fn outbound_messages_are_tagged() {
        let json = serde_json::to_string(&BridgeOutboundMessage::TogglePin { message_id: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"toggle_pin","message_id":3}"#);
    }

    #[test]
    fn escaped_ampersand_is_decoded_last() {
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }
}
