//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"` and by the
//! orchestrator tests. Scripted payloads go through the same
//! [`normalize_event`] as real provider traffic.

use std::sync::{Arc, Mutex};

use futures::stream;

use crate::events::normalize_event;
use crate::{CompletionRequest, CompletionStream, LlmError, LlmRole, LlmService};

/// One step of a scripted provider stream
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Raw `data:` payload as a provider would send it
    Payload(String),
    /// Transport failure at this point of the stream
    Fail(String),
}

impl MockStep {
    /// Anthropic-style text delta carrying `text`
    pub fn text(text: &str) -> Self {
        MockStep::Payload(
            serde_json::json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": { "type": "text_delta", "text": text },
            })
            .to_string(),
        )
    }

    /// Anthropic-style end of message
    pub fn stop() -> Self {
        MockStep::Payload(r#"{"type":"message_stop"}"#.to_string())
    }
}

#[derive(Debug, Clone)]
enum Script {
    /// Echo the last user message back
    Echo,
    Steps(Vec<MockStep>),
    FailOnOpen(String),
}

/// Mock LLM service for testing
#[derive(Debug, Clone)]
pub struct MockLlmService {
    script: Script,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmService {
    /// Create a mock that echoes the last user message
    pub fn new() -> Self {
        Self::with_script(Script::Echo)
    }

    /// Create a mock that plays back `steps` for every request
    pub fn scripted(steps: Vec<MockStep>) -> Self {
        Self::with_script(Script::Steps(steps))
    }

    /// Create a mock streaming `fragments` followed by a stop marker
    pub fn with_fragments(fragments: &[&str]) -> Self {
        let mut steps: Vec<MockStep> = fragments.iter().map(|f| MockStep::text(f)).collect();
        steps.push(MockStep::stop());
        Self::scripted(steps)
    }

    /// Create a mock whose call fails before any fragment is produced
    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::FailOnOpen(message.to_string()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Default for MockLlmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError> {
        tracing::info!("Mock LLM service processing streaming request");

        let steps = match &self.script {
            Script::Echo => {
                let last_user = request
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == LlmRole::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or("empty");
                vec![
                    MockStep::text("Mock response to: "),
                    MockStep::text(last_user),
                    MockStep::stop(),
                ]
            }
            Script::Steps(steps) => steps.clone(),
            Script::FailOnOpen(message) => {
                self.record(request);
                return Err(LlmError::Request(message.clone()));
            }
        };

        self.record(request);

        let events = steps.into_iter().map(|step| match step {
            MockStep::Payload(payload) => Ok(normalize_event(&payload)),
            MockStep::Fail(message) => Err(LlmError::Stream(message)),
        });

        Ok(Box::pin(stream::iter(events)))
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }
}

impl MockLlmService {
    fn record(&self, request: CompletionRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LlmMessage, StreamEvent};
    use futures::StreamExt;

    fn request(content: &str) -> CompletionRequest {
        CompletionRequest {
            model: String::new(),
            system_prompts: Vec::new(),
            messages: vec![LlmMessage {
                role: LlmRole::User,
                content: content.to_string(),
            }],
            max_tokens: None,
            temperature: None,
        }
    }

    async fn collect(service: &MockLlmService, content: &str) -> Vec<Result<StreamEvent, LlmError>> {
        service.stream(request(content)).await.unwrap().collect().await
    }

    #[tokio::test]
    async fn test_echo_mock() {
        let service = MockLlmService::new();
        let text: String = collect(&service, "Hello, world!")
            .await
            .into_iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::Text(t)) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Mock response to: Hello, world!");
    }

    #[tokio::test]
    async fn test_fragments_end_with_stop() {
        let service = MockLlmService::with_fragments(&["Hel", "lo!"]);
        let events = collect(&service, "hi").await;
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], Ok(StreamEvent::Text(t)) if t == "Hel"));
        assert!(matches!(&events[1], Ok(StreamEvent::Text(t)) if t == "lo!"));
        assert!(matches!(&events[2], Ok(StreamEvent::Stop)));
    }

    #[tokio::test]
    async fn test_scripted_failure_mid_stream() {
        let service =
            MockLlmService::scripted(vec![MockStep::text("Par"), MockStep::Fail("boom".into())]);
        let events = collect(&service, "hi").await;
        assert!(matches!(&events[0], Ok(StreamEvent::Text(t)) if t == "Par"));
        assert!(matches!(&events[1], Err(LlmError::Stream(_))));
    }

    #[tokio::test]
    async fn test_failing_mock_records_request() {
        let service = MockLlmService::failing("unavailable");
        let result = service.stream(request("hi")).await;
        assert!(matches!(result, Err(LlmError::Request(_))));
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_requests_are_shared_between_clones() {
        let service = MockLlmService::new();
        let clone = service.clone();
        collect(&clone, "hi").await;
        assert_eq!(service.requests().len(), 1);
        assert_eq!(service.requests()[0].messages[0].content, "hi");
    }

    #[test]
    fn test_mock_default_model() {
        let service = MockLlmService::new();
        assert_eq!(service.default_model(), "mock-model");
    }
}
