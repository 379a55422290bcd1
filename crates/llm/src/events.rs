//! Provider event normalization
//!
//! Providers keep changing how an incremental text fragment is wrapped:
//! Anthropic puts it in `delta.text` of a `content_block_delta`, the
//! Responses API puts a bare string in `delta` of `response.output_text.delta`,
//! chat-completion chunks use `choices[0].delta.content`. Every known envelope
//! is mapped onto one [`StreamEvent`]; anything unrecognized becomes
//! [`StreamEvent::Ignored`].

use serde::Deserialize;

/// Canonical shape of one provider stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Non-empty text fragment to forward
    Text(String),
    /// Provider signalled a clean end of the reply
    Stop,
    /// Provider reported an in-band error
    Failed(String),
    /// Anything else (pings, block starts, usage, unknown shapes)
    Ignored,
}

impl StreamEvent {
    fn text(fragment: String) -> Self {
        if fragment.is_empty() {
            Self::Ignored
        } else {
            Self::Text(fragment)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TaggedEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { delta: BlockDelta },

    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: String },

    #[serde(rename = "message_stop", alias = "response.completed")]
    Stop,

    #[serde(rename = "error", alias = "response.failed")]
    Error {
        #[serde(default)]
        error: Option<ErrorBody>,
        #[serde(default)]
        message: Option<String>,
    },

    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct BlockDelta {
    // input_json_delta and thinking deltas carry no `text`
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    delta: Option<ChatDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Map one raw `data:` payload onto the canonical event shape
pub fn normalize_event(payload: &str) -> StreamEvent {
    let payload = payload.trim();
    if payload == "[DONE]" {
        return StreamEvent::Stop;
    }

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(_) => return StreamEvent::Ignored,
    };

    if value.get("type").is_some() {
        return match serde_json::from_value::<TaggedEvent>(value) {
            Ok(event) => from_tagged(event),
            Err(_) => StreamEvent::Ignored,
        };
    }

    if value.get("choices").is_some() {
        if let Ok(chunk) = serde_json::from_value::<ChatChunk>(value) {
            return from_chat_chunk(chunk);
        }
    }

    StreamEvent::Ignored
}

fn from_tagged(event: TaggedEvent) -> StreamEvent {
    match event {
        TaggedEvent::ContentBlockDelta { delta } => {
            delta.text.map_or(StreamEvent::Ignored, StreamEvent::text)
        }
        TaggedEvent::OutputTextDelta { delta } => StreamEvent::text(delta),
        TaggedEvent::Stop => StreamEvent::Stop,
        TaggedEvent::Error { error, message } => StreamEvent::Failed(
            error
                .and_then(|e| e.message)
                .or(message)
                .unwrap_or_else(|| "provider error".to_string()),
        ),
        TaggedEvent::Other => StreamEvent::Ignored,
    }
}

fn from_chat_chunk(chunk: ChatChunk) -> StreamEvent {
    let Some(choice) = chunk.choices.into_iter().next() else {
        return StreamEvent::Ignored;
    };

    match choice.delta.and_then(|d| d.content) {
        Some(content) if !content.is_empty() => StreamEvent::Text(content),
        _ if choice.finish_reason.is_some() => StreamEvent::Stop,
        _ => StreamEvent::Ignored,
    }
}
