//! Message repository

use crate::domain::entities::{Message, MessageRole};
use quizdesk_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List messages for a conversation, ordered by sequence ASC
    pub async fn list_by_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, sequence, created_at
            FROM quiz_messages
            WHERE conversation_id = $1
            ORDER BY sequence ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Append a message, assigning the next sequence number in the same statement
    pub async fn append(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message> {
        Message::validate_content(content)?;

        let created = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO quiz_messages (id, conversation_id, role, content, sequence, created_at)
            VALUES (
                $1, $2, $3, $4,
                (SELECT COALESCE(MAX(sequence), 0) + 1 FROM quiz_messages WHERE conversation_id = $2),
                NOW()
            )
            RETURNING id, conversation_id, role, content, sequence, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
