//! Route definitions for Conversations domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{conversations, stream};
use super::middleware::ConversationsState;

/// Create conversation routes
fn conversation_routes() -> Router<ConversationsState> {
    Router::new()
        .route(
            "/v1/quiz/conversations",
            post(conversations::create_conversation),
        )
        .route(
            "/v1/quiz/conversations/{id}/messages",
            get(conversations::list_messages),
        )
        .route(
            "/v1/quiz/conversations/{id}/progress",
            get(conversations::get_progress),
        )
}

/// Create streaming turn routes
fn stream_routes() -> Router<ConversationsState> {
    Router::new().route("/v1/quiz/stream", get(stream::stream_turn))
}

/// Create all Conversations domain API routes
pub fn routes() -> Router<ConversationsState> {
    Router::new()
        .merge(conversation_routes())
        .merge(stream_routes())
}
