//! Conversation progress tracking
//!
//! Derives which catalogue questions have already surfaced in a conversation.
//! Detection is pluggable through [`CoverageDetector`]; the default,
//! [`SubstringCoverage`], counts a question as asked once an assistant message
//! contains its exact text. Paraphrased questions are not detected.

use std::sync::Arc;

use serde::Serialize;

use quizdesk_questions::QuestionDefinition;

use super::entities::{Message, MessageRole};

/// Decides whether a question has been covered by the assistant so far
pub trait CoverageDetector: Send + Sync {
    fn is_asked(&self, question: &QuestionDefinition, assistant_messages: &[&str]) -> bool;
}

/// Exact-substring detection over assistant messages
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringCoverage;

impl CoverageDetector for SubstringCoverage {
    fn is_asked(&self, question: &QuestionDefinition, assistant_messages: &[&str]) -> bool {
        let text = question.text.trim();
        !text.is_empty() && assistant_messages.iter().any(|m| m.contains(text))
    }
}

/// Snapshot of how far a conversation has progressed through the catalogue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationProgress {
    /// Asked questions, in catalogue order
    pub asked: Vec<QuestionDefinition>,
    /// Unasked questions by ascending priority, ties in catalogue order
    pub remaining: Vec<QuestionDefinition>,
    /// What should be asked next; the opening question while it is unasked
    pub next_question: Option<QuestionDefinition>,
    pub opening_question: Option<QuestionDefinition>,
    pub first_user_message: Option<String>,
    pub last_assistant_message: Option<String>,
    pub latest_user_message: Option<String>,
    pub message_count: usize,
}

impl ConversationProgress {
    /// True until the assistant has said anything
    pub fn is_new(&self) -> bool {
        self.last_assistant_message.is_none()
    }

    /// Up to `n` questions to ask next, starting with `next_question`
    pub fn upcoming(&self, n: usize) -> Vec<&QuestionDefinition> {
        let first = self.next_question.as_ref();
        first
            .into_iter()
            .chain(
                self.remaining
                    .iter()
                    .filter(move |q| first.map_or(true, |f| f.id != q.id)),
            )
            .take(n)
            .collect()
    }
}

/// Builds [`ConversationProgress`] from history and catalogue
#[derive(Clone)]
pub struct ProgressTracker {
    coverage: Arc<dyn CoverageDetector>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Arc::new(SubstringCoverage))
    }
}

impl ProgressTracker {
    pub fn new(coverage: Arc<dyn CoverageDetector>) -> Self {
        Self { coverage }
    }

    pub fn track(
        &self,
        messages: &[Message],
        questions: &[QuestionDefinition],
    ) -> ConversationProgress {
        let assistant_messages: Vec<&str> = messages
            .iter()
            .filter(|m| m.is_assistant())
            .map(|m| m.content.as_str())
            .collect();

        let (asked, mut remaining): (Vec<QuestionDefinition>, Vec<QuestionDefinition>) = questions
            .iter()
            .cloned()
            .partition(|q| self.coverage.is_asked(q, &assistant_messages));

        // Stable sort keeps catalogue order among equal priorities
        remaining.sort_by_key(|q| q.priority_key());

        let opening_question = questions.iter().find(|q| q.is_opening()).cloned();

        let next_question = opening_question
            .as_ref()
            .filter(|opening| remaining.iter().any(|q| q.id == opening.id))
            .or_else(|| remaining.first())
            .cloned();

        let first_user_message = messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone());

        let latest_user_message = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone());

        ConversationProgress {
            asked,
            remaining,
            next_question,
            opening_question,
            first_user_message,
            last_assistant_message: assistant_messages.last().map(|m| m.to_string()),
            latest_user_message,
            message_count: messages.len(),
        }
    }
}
