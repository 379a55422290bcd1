//! In-memory question bank for tests and local development

use async_trait::async_trait;
use quizdesk_common::Result;

use super::QuestionBank;
use crate::domain::entities::{InstructionSettings, QuestionDefinition, ReferenceDocument};

/// Fixed catalogue held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Vec<QuestionDefinition>,
    settings: Option<InstructionSettings>,
    documents: Vec<ReferenceDocument>,
}

impl InMemoryQuestionBank {
    pub fn new(questions: Vec<QuestionDefinition>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    pub fn with_settings(mut self, settings: InstructionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_documents(mut self, documents: Vec<ReferenceDocument>) -> Self {
        self.documents = documents;
        self
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn list_questions(&self) -> Result<Vec<QuestionDefinition>> {
        Ok(self.questions.clone())
    }

    async fn instruction_settings(&self) -> Result<Option<InstructionSettings>> {
        Ok(self.settings.clone())
    }

    async fn reference_documents(&self) -> Result<Vec<ReferenceDocument>> {
        Ok(self.documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::QuestionType;

    #[tokio::test]
    async fn test_empty_bank_degrades_to_defaults() {
        let bank = InMemoryQuestionBank::default();
        assert!(bank.list_questions().await.unwrap().is_empty());
        assert!(bank.instruction_settings().await.unwrap().is_none());
        assert!(bank.reference_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bank_preserves_catalogue_order() {
        let first = QuestionDefinition::new("First?", Some(9), QuestionType::OpenEnded);
        let second = QuestionDefinition::new("Second?", Some(1), QuestionType::OpenEnded);
        let bank = InMemoryQuestionBank::new(vec![first.clone(), second.clone()])
            .with_documents(vec![ReferenceDocument::new("Returns", "30 days")]);

        let questions = bank.list_questions().await.unwrap();
        assert_eq!(questions[0].id, first.id);
        assert_eq!(questions[1].id, second.id);
        assert_eq!(bank.reference_documents().await.unwrap().len(), 1);
    }
}
