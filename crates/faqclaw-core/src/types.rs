//! Message types exchanged between channels and the conversation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direct chat or group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadType {
    Direct,
    Group,
}

/// A message received from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub channel: String,
    pub thread_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub content: String,
    pub thread_type: ThreadType,
    pub timestamp: DateTime<Utc>,
    pub reply_to: Option<String>,
}

impl IncomingMessage {
    /// Session key: one conversation state per sender per chat.
    pub fn session_id(&self) -> String {
        format!("{}:{}:{}", self.channel, self.thread_id, self.sender_id)
    }
}

/// File payload attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// A message sent back through a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub thread_id: String,
    pub content: String,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    pub reply_to: Option<String>,
}

impl OutgoingMessage {
    pub fn text(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            content: content.into(),
            attachment: None,
            reply_to: None,
        }
    }

    /// Document message; `content` becomes the caption.
    pub fn document(
        thread_id: impl Into<String>,
        caption: impl Into<String>,
        attachment: Attachment,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            content: caption.into(),
            attachment: Some(attachment),
            reply_to: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_per_sender_and_chat() {
        let msg = IncomingMessage {
            channel: "telegram".into(),
            thread_id: "-100".into(),
            sender_id: "42".into(),
            sender_name: None,
            content: "ciao".into(),
            thread_type: ThreadType::Group,
            timestamp: Utc::now(),
            reply_to: None,
        };
        assert_eq!(msg.session_id(), "telegram:-100:42");
    }

    #[test]
    fn test_document_message_keeps_caption() {
        let msg = OutgoingMessage::document(
            "1",
            "backup",
            Attachment {
                filename: "db.json".into(),
                content: b"{}".to_vec(),
            },
        );
        assert_eq!(msg.content, "backup");
        assert_eq!(msg.attachment.unwrap().filename, "db.json");
    }
}
