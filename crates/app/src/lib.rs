//! Quizdesk application composition root
//!
//! Wires the question bank, conversation store and LLM provider into the
//! conversations router.

use std::sync::Arc;

use axum::Router;
use quizdesk_common::config::Config;
use quizdesk_conversations::{
    ConversationStore, ConversationsRepositories, ConversationsState, TurnCoordinator,
    TurnSettings,
};
use quizdesk_llm::{LlmConfig, LlmService, LlmServiceFactory};
use quizdesk_questions::{PgQuestionBank, QuestionBank};
use sqlx::PgPool;

/// Everything a router needs, independent of where the data lives
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn ConversationStore>,
    pub questions: Arc<dyn QuestionBank>,
    pub llm: Arc<dyn LlmService>,
    pub settings: TurnSettings,
}

/// Create the main application router backed by PostgreSQL and the configured provider
pub async fn create_app(
    config: Config,
    llm_config: LlmConfig,
    pool: PgPool,
) -> Result<Router, anyhow::Error> {
    let temperature = llm_config.temperature;
    let llm = LlmServiceFactory::create(llm_config)?;

    let services = AppServices {
        store: Arc::new(ConversationsRepositories::new(pool.clone())),
        questions: Arc::new(PgQuestionBank::new(pool)),
        llm: Arc::from(llm),
        settings: TurnSettings {
            timeout: config.turn_timeout(),
            temperature: Some(temperature),
            ..TurnSettings::default()
        },
    };

    Ok(build_router(services))
}

/// Compose domain routers with shared infrastructure routes
pub fn build_router(services: AppServices) -> Router {
    let coordinator = TurnCoordinator::new(
        services.store.clone(),
        services.questions.clone(),
        services.llm,
    )
    .with_settings(services.settings);

    let state = ConversationsState::new(services.store, services.questions, coordinator);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Quizdesk API v0.0.1-SNAPSHOT" }),
        )
        .merge(quizdesk_conversations::routes().with_state(state))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
