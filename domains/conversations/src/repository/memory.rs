//! In-memory conversation store for tests and local development

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use quizdesk_common::{Error, Result};
use uuid::Uuid;

use super::ConversationStore;
use crate::domain::entities::{Conversation, Message, MessageRole};

#[derive(Debug, Default)]
struct Tables {
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Vec<Message>>,
}

/// Conversation store backed by process memory; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationStore {
    tables: Arc<Mutex<Tables>>,
    fail_assistant_writes: Arc<AtomicBool>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent assistant-message append fail
    pub fn fail_assistant_writes(&self) {
        self.fail_assistant_writes.store(true, Ordering::SeqCst);
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| Error::Internal("conversation store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.tables()?.conversations.get(&id).cloned())
    }

    async fn create_conversation(&self, conversation: &Conversation) -> Result<Conversation> {
        let mut tables = self.tables()?;
        if tables.conversations.contains_key(&conversation.id) {
            return Err(Error::Conflict("Conversation already exists".to_string()));
        }
        tables
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(conversation.clone())
    }

    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        Ok(self
            .tables()?
            .messages
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        if role == MessageRole::Assistant && self.fail_assistant_writes.load(Ordering::SeqCst) {
            return Err(Error::Internal("assistant write rejected".to_string()));
        }

        let mut tables = self.tables()?;
        if !tables.conversations.contains_key(&conversation_id) {
            return Err(Error::NotFound("Conversation not found".to_string()));
        }

        let history = tables.messages.entry(conversation_id).or_default();
        let sequence = history.len() as i32 + 1;
        let message = Message::new(conversation_id, role, content.to_string(), sequence)?;
        history.push(message.clone());
        Ok(message)
    }

    async fn touch_conversation(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables()?;
        let conv = tables
            .conversations
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;
        conv.last_message_at = Some(Utc::now());
        Ok(())
    }
}
