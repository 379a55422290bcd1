//! Conversation repository

use crate::domain::entities::Conversation;
use quizdesk_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find conversation by ID
    pub async fn find(&self, id: Uuid) -> Result<Option<Conversation>> {
        let conv = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, user_id, last_message_at, created_at
            FROM quiz_conversations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(conv)
    }

    /// Create a new conversation
    pub async fn create(&self, conv: &Conversation) -> Result<Conversation> {
        let created = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO quiz_conversations (id, user_id, last_message_at, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, last_message_at, created_at
            "#,
        )
        .bind(conv.id)
        .bind(conv.user_id)
        .bind(conv.last_message_at)
        .bind(conv.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Set last_message_at to now after a completed turn
    pub async fn touch(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE quiz_conversations SET last_message_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
