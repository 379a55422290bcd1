//! Domain entities for the Questions domain
//!
//! Question definitions are owned by administrators; from the orchestrator's
//! side every type here is read-only.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Question type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Asked before anything else in a brand-new conversation
    Opening,
    #[default]
    OpenEnded,
    MultipleChoice,
    YesNo,
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Opening => write!(f, "opening"),
            QuestionType::OpenEnded => write!(f, "open_ended"),
            QuestionType::MultipleChoice => write!(f, "multiple_choice"),
            QuestionType::YesNo => write!(f, "yes_no"),
        }
    }
}

/// Phrase-to-canned-response override attached to one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConditionalTrigger {
    pub id: Uuid,
    pub question_id: Uuid,
    pub trigger_phrase: String,
    pub response: String,
}

impl ConditionalTrigger {
    pub fn new(question_id: Uuid, trigger_phrase: &str, response: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            trigger_phrase: trigger_phrase.to_string(),
            response: response.to_string(),
        }
    }
}

/// One entry of the question catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDefinition {
    pub id: Uuid,
    pub text: String,
    /// Lower is earlier; `None` sorts after every numbered question
    pub priority: Option<i32>,
    pub question_type: QuestionType,
    pub category: Option<String>,
    /// Default answer when no conditional trigger applies
    pub fallback_response: Option<String>,
    pub triggers: Vec<ConditionalTrigger>,
}

impl QuestionDefinition {
    /// Create a question with no category, fallback, or triggers
    pub fn new(text: &str, priority: Option<i32>, question_type: QuestionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            priority,
            question_type,
            category: None,
            fallback_response: None,
            triggers: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_fallback(mut self, fallback: &str) -> Self {
        self.fallback_response = Some(fallback.to_string());
        self
    }

    /// Attach a trigger owned by this question
    pub fn with_trigger(mut self, phrase: &str, response: &str) -> Self {
        self.triggers
            .push(ConditionalTrigger::new(self.id, phrase, response));
        self
    }

    pub fn is_opening(&self) -> bool {
        self.question_type == QuestionType::Opening
    }

    /// Sort key: numbered priorities ascending, then unnumbered ones
    #[mutants::skip] // Exercised through the tracker ordering tests
    pub fn priority_key(&self) -> (bool, i32) {
        match self.priority {
            Some(p) => (false, p),
            None => (true, 0),
        }
    }
}

/// Persona and guard-rail text, one active record per tenant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InstructionSettings {
    pub persona: String,
    pub tone: String,
    pub forbidden_topics: String,
    pub business_context: String,
    pub language: String,
}

/// Free-form reference material included in every prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferenceDocument {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

impl ReferenceDocument {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}
