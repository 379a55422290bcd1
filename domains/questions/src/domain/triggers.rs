//! Conditional trigger matching
//!
//! Matching only produces candidates. Whether a canned response is actually
//! used is left to the model, which sees the candidates in its instructions.

use serde::Serialize;
use uuid::Uuid;

use super::entities::QuestionDefinition;

/// A trigger whose phrase occurs in the latest user utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerMatch {
    pub question_id: Uuid,
    pub trigger_phrase: String,
    pub response: String,
}

/// Triggers of `question` whose phrase occurs in `utterance`, case-insensitively.
///
/// Blank phrases never match. Result order follows the question's trigger order.
pub fn match_triggers(question: &QuestionDefinition, utterance: &str) -> Vec<TriggerMatch> {
    let haystack = utterance.to_lowercase();
    matching(question, &haystack)
}

/// Trigger matches across every question that declares triggers
pub fn matches_for_catalogue(
    questions: &[QuestionDefinition],
    utterance: &str,
) -> Vec<TriggerMatch> {
    let haystack = utterance.to_lowercase();
    questions
        .iter()
        .filter(|q| !q.triggers.is_empty())
        .flat_map(|q| matching(q, &haystack))
        .collect()
}

fn matching(question: &QuestionDefinition, haystack: &str) -> Vec<TriggerMatch> {
    question
        .triggers
        .iter()
        .filter(|t| {
            let needle = t.trigger_phrase.trim().to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        })
        .map(|t| TriggerMatch {
            question_id: question.id,
            trigger_phrase: t.trigger_phrase.clone(),
            response: t.response.clone(),
        })
        .collect()
}
