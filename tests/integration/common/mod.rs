//! Shared fixtures for API tests
//!
//! Every test gets its own router over fresh in-memory stores, so tests never
//! share state and need no database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use serde_json::Value;
use uuid::Uuid;

use quizdesk_app::{build_router, AppServices};
use quizdesk_conversations::{
    Conversation, ConversationStore, InMemoryConversationStore, TurnSettings,
};
use quizdesk_llm::MockLlmService;
use quizdesk_questions::{InMemoryQuestionBank, QuestionDefinition, QuestionType};

pub const OPENING_QUESTION: &str = "What brings you to open water swimming?";
pub const LEVEL_QUESTION: &str = "How would you describe your swimming level?";
pub const TEMPERATURE_QUESTION: &str = "How do you feel about cold water?";

/// The swim-coaching catalogue used across API tests
pub fn swim_catalogue() -> Vec<QuestionDefinition> {
    vec![
        QuestionDefinition::new(OPENING_QUESTION, Some(1), QuestionType::Opening),
        QuestionDefinition::new(LEVEL_QUESTION, Some(2), QuestionType::OpenEnded)
            .with_trigger("beginner", "Great, let's start simple!"),
        QuestionDefinition::new(TEMPERATURE_QUESTION, Some(3), QuestionType::OpenEnded)
            .with_trigger("Cold Water", "Wetsuits help a lot."),
    ]
}

pub struct TestApp {
    pub store: InMemoryConversationStore,
    pub llm: MockLlmService,
    router: Router,
}

impl TestApp {
    pub fn new(llm: MockLlmService) -> Self {
        let store = InMemoryConversationStore::new();
        let router = build_router(AppServices {
            store: Arc::new(store.clone()),
            questions: Arc::new(InMemoryQuestionBank::new(swim_catalogue())),
            llm: Arc::new(llm.clone()),
            settings: TurnSettings::default(),
        });
        Self { store, llm, router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Seed a conversation directly in the store
    pub async fn conversation(&self) -> Uuid {
        self.store
            .create_conversation(&Conversation::new(None))
            .await
            .unwrap()
            .id
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn stream_uri(conversation_id: Uuid, message: &str) -> String {
    let encoded: String = message
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect();
    format!(
        "/v1/quiz/stream?conversation_id={}&message={}",
        conversation_id, encoded
    )
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn parse_body(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// JSON envelopes carried by the `data:` lines of an event-stream body
pub fn sse_envelopes(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}
