//! Per-turn prompt composition
//!
//! The instruction payload has two parts. `instructions` depends only on the
//! admin-managed configuration (settings, catalogue, reference documents);
//! `progress` is regenerated from the history every turn. Composition never
//! touches the datastore or the model.

use std::fmt::Write;

use quizdesk_llm::LlmMessage;
use quizdesk_questions::{
    matches_for_catalogue, InstructionSettings, QuestionDefinition, ReferenceDocument,
};

use super::entities::Message;
use super::progress::{ConversationProgress, ProgressTracker};

/// How many unasked questions the progress digest lists
const UPCOMING_QUESTIONS: usize = 3;

const CONVERSATION_RULES: &[&str] = &[
    "Ask exactly one question per reply.",
    "After asking a question, wait for the user's answer before moving on.",
    "Pick the next question by priority, but prefer one that follows naturally from what the user just said.",
    "Never repeat a question that appears under \"Already asked\" in the progress section.",
    "If the progress section says the conversation is new, greet the user and ask the opening question first.",
    "Conditional responses are suggestions. Use one only when it fits the user's reply; otherwise answer in your own words.",
    "When no conditional response fits and the user is unsure, the fallback response may be used.",
];

/// Fully composed instruction payload for one turn
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    /// Persona, rules, catalogue and reference material
    pub instructions: String,
    /// Conversation-progress digest
    pub progress: String,
    /// Verbatim history, oldest first
    pub messages: Vec<LlmMessage>,
}

impl ComposedPrompt {
    /// System blocks in the order they are sent to the provider
    pub fn system_prompts(&self) -> Vec<String> {
        vec![self.instructions.clone(), self.progress.clone()]
    }
}

/// Composes [`ComposedPrompt`]s
#[derive(Clone, Default)]
pub struct PromptComposer {
    tracker: ProgressTracker,
}

impl PromptComposer {
    pub fn compose(
        &self,
        settings: Option<&InstructionSettings>,
        questions: &[QuestionDefinition],
        documents: &[ReferenceDocument],
        messages: &[Message],
    ) -> ComposedPrompt {
        let defaults = InstructionSettings::default();
        let settings = settings.unwrap_or(&defaults);
        let progress = self.tracker.track(messages, questions);

        let instructions = [
            render_persona(settings),
            render_rules(),
            render_catalogue(questions),
            render_documents(documents),
        ]
        .join("\n");

        ComposedPrompt {
            instructions,
            progress: render_progress(&progress, questions),
            messages: messages.iter().map(Message::to_llm).collect(),
        }
    }
}

fn render_persona(settings: &InstructionSettings) -> String {
    let mut out = String::from("## Role and tone\n");
    let _ = writeln!(out, "Persona: {}", settings.persona);
    let _ = writeln!(out, "Tone: {}", settings.tone);
    let _ = writeln!(out, "Preferred language: {}", settings.language);
    let _ = writeln!(out, "Forbidden topics: {}", settings.forbidden_topics);
    let _ = writeln!(out, "Business context:\n{}", settings.business_context);
    out
}

fn render_rules() -> String {
    let mut out = String::from("## Conversation rules\n");
    for rule in CONVERSATION_RULES {
        let _ = writeln!(out, "- {}", rule);
    }
    out
}

fn render_catalogue(questions: &[QuestionDefinition]) -> String {
    let mut out = String::from("## Question catalogue\n");
    for (index, q) in questions.iter().enumerate() {
        let priority = q
            .priority
            .map_or_else(|| "unset".to_string(), |p| p.to_string());
        let _ = writeln!(
            out,
            "### Question {} (priority: {}, type: {}, category: {})",
            index + 1,
            priority,
            q.question_type,
            q.category.as_deref().unwrap_or("none")
        );
        let _ = writeln!(out, "Text: \"{}\"", q.text);
        if let Some(fallback) = &q.fallback_response {
            let _ = writeln!(out, "Fallback response: {}", fallback);
        }
        if !q.triggers.is_empty() {
            out.push_str("Conditional responses:\n");
            for t in &q.triggers {
                let _ = writeln!(
                    out,
                    "- if the user mentions \"{}\": {}",
                    t.trigger_phrase, t.response
                );
            }
        }
    }
    out
}

fn render_documents(documents: &[ReferenceDocument]) -> String {
    let mut out = String::from("## Reference material\n");
    for doc in documents {
        let _ = writeln!(out, "### {}\n{}", doc.title, doc.description);
    }
    out
}

fn render_progress(progress: &ConversationProgress, questions: &[QuestionDefinition]) -> String {
    let mut out = String::from("## Conversation progress\n");
    let _ = writeln!(out, "Messages so far: {}", progress.message_count);

    if progress.is_new() {
        out.push_str("The conversation is new: no assistant message has been sent yet.\n");
    }

    if let Some(opening) = &progress.opening_question {
        let _ = writeln!(out, "Opening question: \"{}\"", opening.text);
    }
    if let Some(first) = &progress.first_user_message {
        let _ = writeln!(out, "First user reply: \"{}\"", first);
    }
    if let Some(last) = &progress.last_assistant_message {
        let _ = writeln!(out, "Last assistant message: \"{}\"", last);
    }

    out.push_str("Already asked:\n");
    for q in &progress.asked {
        let _ = writeln!(out, "- \"{}\"", q.text);
    }

    out.push_str("Next questions by priority:\n");
    for q in progress.upcoming(UPCOMING_QUESTIONS) {
        let _ = writeln!(out, "- \"{}\"", q.text);
    }

    if let Some(latest) = &progress.latest_user_message {
        let matches = matches_for_catalogue(questions, latest);
        if !matches.is_empty() {
            out.push_str("Conditional responses matching the latest user message:\n");
            for m in matches {
                let _ = writeln!(out, "- \"{}\": {}", m.trigger_phrase, m.response);
            }
        }
    }

    out
}
