//! Repository implementations for the Questions domain

pub mod memory;
pub mod questions;

use async_trait::async_trait;
use quizdesk_common::Result;

use crate::domain::entities::{InstructionSettings, QuestionDefinition, ReferenceDocument};

pub use memory::InMemoryQuestionBank;
pub use questions::PgQuestionBank;

/// Read-only view over the admin-managed question catalogue
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Every active question with its triggers, in catalogue order
    async fn list_questions(&self) -> Result<Vec<QuestionDefinition>>;

    /// The active instruction settings, if any were configured
    async fn instruction_settings(&self) -> Result<Option<InstructionSettings>>;

    /// Every active reference document, in catalogue order
    async fn reference_documents(&self) -> Result<Vec<ReferenceDocument>>;
}
