//! Chat conversation model for storage and API.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

impl MessageRole {
    /// Wire name expected by the Gemini API.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Model => "model",
        }
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// When the turn was recorded (RFC3339)
    pub timestamp: String,
    pub audio_url: Option<String>,
}

/// Optional conversation metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMetadata {
    pub crop_context: Option<String>,
    pub location: Option<String>,
}

/// One conversation thread, owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    /// Document ID (UUID v4)
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    /// Ordered turns, oldest first
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// Conversation language ("en" or "hi")
    pub language: String,
    pub metadata: Option<ChatMetadata>,
    pub created_at: String,
    pub updated_at: String,
}
