//! Conversation session API handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use quizdesk_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{Conversation, Message, MessageRole};
use crate::domain::progress::ConversationProgress;

/// Request for creating a conversation
#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    /// Optional owner; anonymous sessions are allowed
    pub user_id: Option<Uuid>,
}

/// Conversation response DTO
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            last_message_at: c.last_message_at,
            created_at: c.created_at,
        }
    }
}

/// Message response DTO
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            role: m.role,
            content: m.content,
            sequence: m.sequence,
            created_at: m.created_at,
        }
    }
}

/// Start a new quiz session
pub async fn create_conversation(
    State(state): State<ConversationsState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ConversationResponse>)> {
    // An empty body starts an anonymous session
    let req = if body.is_empty() {
        CreateConversationRequest::default()
    } else {
        serde_json::from_slice::<CreateConversationRequest>(&body)
            .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?
    };
    let conversation = Conversation::new(req.user_id);

    let created = state.store.create_conversation(&conversation).await?;
    tracing::info!(conversation_id = %created.id, "Conversation created");

    Ok((StatusCode::CREATED, Json(created.into())))
}

async fn require_conversation(state: &ConversationsState, id: Uuid) -> Result<Conversation> {
    state
        .store
        .find_conversation(id)
        .await?
        .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))
}

/// List the ordered history of a conversation
pub async fn list_messages(
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MessageResponse>>> {
    require_conversation(&state, id).await?;

    let messages = state.store.list_messages(id).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Show which catalogue questions a conversation has covered
pub async fn get_progress(
    State(state): State<ConversationsState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationProgress>> {
    require_conversation(&state, id).await?;

    let messages = state.store.list_messages(id).await?;
    let questions = state.questions.list_questions().await?;

    Ok(Json(state.tracker.track(&messages, &questions)))
}
