//! Questions domain: question catalogue, conditional triggers, instruction settings

pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{
    ConditionalTrigger, InstructionSettings, QuestionDefinition, QuestionType, ReferenceDocument,
};
pub use domain::triggers::{match_triggers, matches_for_catalogue, TriggerMatch};

// Re-export repository types
pub use repository::{InMemoryQuestionBank, PgQuestionBank, QuestionBank};
