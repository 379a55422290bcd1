//! Domain entities for the Conversations domain
//!
//! A conversation is created once at session start and afterwards only has
//! its `last_message_at` bumped. Messages are append-only and ordered by
//! `sequence`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quizdesk_common::{Error, Result};
use quizdesk_llm::{LlmMessage, LlmRole};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl From<MessageRole> for LlmRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => LlmRole::User,
            MessageRole::Assistant => LlmRole::Assistant,
        }
    }
}

/// Maximum message length accepted from a client
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation, optionally owned by a storefront user
    pub fn new(user_id: Option<Uuid>) -> Self {
        Conversation {
            id: Uuid::new_v4(),
            user_id,
            last_message_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message at `sequence`
    pub fn new(
        conversation_id: Uuid,
        role: MessageRole,
        content: String,
        sequence: i32,
    ) -> Result<Self> {
        Self::validate_content(&content)?;
        Self::validate_sequence(sequence)?;

        Ok(Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content,
            sequence,
            created_at: Utc::now(),
        })
    }

    /// Validate message content (CHECK (length(trim(content)) > 0))
    pub fn validate_content(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(Error::Validation(
                "Message content cannot be empty or whitespace-only".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate sequence (CHECK (sequence >= 1))
    fn validate_sequence(sequence: i32) -> Result<()> {
        if sequence < 1 {
            return Err(Error::Validation(
                "Message sequence must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    /// Provider view of this message
    pub fn to_llm(&self) -> LlmMessage {
        LlmMessage {
            role: self.role.into(),
            content: self.content.clone(),
        }
    }
}
