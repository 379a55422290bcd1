//! Streaming turn handler

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use quizdesk_common::{Result, ValidatedQuery};
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::coordinator::{StreamEnvelope, TurnRequest};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Query for one streamed turn
#[derive(Debug, Deserialize, Validate)]
pub struct StreamQuery {
    #[validate(required)]
    pub conversation_id: Option<Uuid>,

    #[validate(required, length(min = 1))]
    pub message: Option<String>,
}

fn to_event(envelope: StreamEnvelope) -> Event {
    match serde_json::to_string(&envelope) {
        Ok(data) => Event::default().data(data),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize stream envelope");
            Event::default().data(r#"{"error":"Failed to generate a response"}"#)
        }
    }
}

/// Run one turn and stream its envelopes as server-sent events
pub async fn stream_turn(
    State(state): State<ConversationsState>,
    ValidatedQuery(query): ValidatedQuery<StreamQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let request = TurnRequest::new(query.conversation_id, query.message)?;
    let rx = state.coordinator.start_turn(request).await?;

    let stream = ReceiverStream::new(rx).map(|envelope| Ok(to_event(envelope)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}
