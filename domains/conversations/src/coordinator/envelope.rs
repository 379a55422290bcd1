//! Envelopes sent to the client over the turn's event stream

use serde::Serialize;

/// The only error text a client ever sees
pub const GENERIC_ERROR: &str = "Failed to generate a response";

fn is_false(value: &bool) -> bool {
    !*value
}

/// One JSON envelope of the outbound stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StreamEnvelope {
    /// Text fragment, or the empty "connection established" marker
    Content {
        content: String,
        #[serde(skip_serializing_if = "is_false")]
        connecting: bool,
    },
    /// Terminal success marker
    Done { done: bool },
    /// Terminal failure marker
    Error { error: String },
}

impl StreamEnvelope {
    pub fn connecting() -> Self {
        Self::Content {
            content: String::new(),
            connecting: true,
        }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self::Content {
            content: text.into(),
            connecting: false,
        }
    }

    pub fn done() -> Self {
        Self::Done { done: true }
    }

    pub fn error() -> Self {
        Self::Error {
            error: GENERIC_ERROR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connecting_envelope() {
        let value = serde_json::to_value(StreamEnvelope::connecting()).unwrap();
        assert_eq!(value, json!({"content": "", "connecting": true}));
    }

    #[test]
    fn test_content_envelope_omits_connecting() {
        let value = serde_json::to_value(StreamEnvelope::content("Hel")).unwrap();
        assert_eq!(value, json!({"content": "Hel"}));
    }

    #[test]
    fn test_done_envelope() {
        let value = serde_json::to_value(StreamEnvelope::done()).unwrap();
        assert_eq!(value, json!({"done": true}));
    }

    #[test]
    fn test_error_envelope_is_generic() {
        let value = serde_json::to_value(StreamEnvelope::error()).unwrap();
        assert_eq!(value, json!({"error": GENERIC_ERROR}));
    }
}
