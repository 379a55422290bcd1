//! PostgreSQL question bank

use std::collections::HashMap;

use async_trait::async_trait;
use quizdesk_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::QuestionBank;
use crate::domain::entities::{
    ConditionalTrigger, InstructionSettings, QuestionDefinition, QuestionType, ReferenceDocument,
};

#[derive(Debug, sqlx::FromRow)]
struct QuestionRow {
    id: Uuid,
    text: String,
    priority: Option<i32>,
    question_type: QuestionType,
    category: Option<String>,
    fallback_response: Option<String>,
}

#[derive(Clone)]
pub struct PgQuestionBank {
    pool: PgPool,
}

impl PgQuestionBank {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Triggers of every active question, grouped by question
    async fn triggers_by_question(&self) -> Result<HashMap<Uuid, Vec<ConditionalTrigger>>> {
        let triggers = sqlx::query_as::<_, ConditionalTrigger>(
            r#"
            SELECT c.id, c.question_id, c.trigger_phrase, c.response
            FROM quiz_conditionals c
            JOIN quiz_questions q ON q.id = c.question_id
            WHERE q.is_active
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<ConditionalTrigger>> = HashMap::new();
        for trigger in triggers {
            grouped.entry(trigger.question_id).or_default().push(trigger);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl QuestionBank for PgQuestionBank {
    async fn list_questions(&self) -> Result<Vec<QuestionDefinition>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, text, priority, question_type, category, fallback_response
            FROM quiz_questions
            WHERE is_active
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut triggers = self.triggers_by_question().await?;

        let questions = rows
            .into_iter()
            .map(|row| QuestionDefinition {
                triggers: triggers.remove(&row.id).unwrap_or_default(),
                id: row.id,
                text: row.text,
                priority: row.priority,
                question_type: row.question_type,
                category: row.category,
                fallback_response: row.fallback_response,
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = questions.len(), "Loaded active questions");
        Ok(questions)
    }

    async fn instruction_settings(&self) -> Result<Option<InstructionSettings>> {
        let settings = sqlx::query_as::<_, InstructionSettings>(
            r#"
            SELECT COALESCE(persona, '') AS persona,
                   COALESCE(tone, '') AS tone,
                   COALESCE(forbidden_topics, '') AS forbidden_topics,
                   COALESCE(business_context, '') AS business_context,
                   COALESCE(language, '') AS language
            FROM quiz_instructions
            WHERE is_active
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    async fn reference_documents(&self) -> Result<Vec<ReferenceDocument>> {
        let documents = sqlx::query_as::<_, ReferenceDocument>(
            r#"
            SELECT id, title, COALESCE(description, '') AS description
            FROM quiz_reference_documents
            WHERE is_active
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }
}
