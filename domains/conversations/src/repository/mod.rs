//! Repository implementations for Conversations domain

pub mod conversations;
pub mod memory;
pub mod messages;

use async_trait::async_trait;
use quizdesk_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entities::{Conversation, Message, MessageRole};

pub use conversations::ConversationRepository;
pub use memory::InMemoryConversationStore;
pub use messages::MessageRepository;

/// Read/append access to conversations and their ordered history
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>>;

    async fn create_conversation(&self, conversation: &Conversation) -> Result<Conversation>;

    /// Messages of one conversation, oldest first
    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>>;

    /// Append a message at the end of the conversation
    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message>;

    /// Bump `last_message_at` after a completed turn
    async fn touch_conversation(&self, id: Uuid) -> Result<()>;
}

/// Combined PostgreSQL repository access for the Conversations domain
#[derive(Clone)]
pub struct ConversationsRepositories {
    pub conversations: ConversationRepository,
    pub messages: MessageRepository,
}

impl ConversationsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
        }
    }
}

#[async_trait]
impl ConversationStore for ConversationsRepositories {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        self.conversations.find(id).await
    }

    async fn create_conversation(&self, conversation: &Conversation) -> Result<Conversation> {
        self.conversations.create(conversation).await
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        self.messages.list_by_conversation(conversation_id).await
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        self.messages.append(conversation_id, role, content).await
    }

    async fn touch_conversation(&self, id: Uuid) -> Result<()> {
        self.conversations.touch(id).await
    }
}
