//! Anthropic Claude API Implementation
//!
//! Calls the Anthropic Messages API (https://api.anthropic.com/v1/messages)
//! in streaming mode using reqwest HTTP client.

use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::events::normalize_event;
use crate::sse::SseDecoder;
use crate::{CompletionRequest, CompletionStream, LlmConfig, LlmError, LlmRole, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Anthropic Messages API request body
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<SystemBlock>,
    messages: Vec<MessageBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct SystemBlock {
    #[serde(rename = "type")]
    block_type: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    role: &'static str,
    content: String,
}

/// Anthropic API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Anthropic LLM service implementation
pub struct AnthropicService {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl AnthropicService {
    /// Create a new Anthropic service
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LlmError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    fn build_body(&self, request: CompletionRequest) -> MessagesRequest {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model
        };

        let system = request
            .system_prompts
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .map(|text| SystemBlock {
                block_type: "text",
                text,
            })
            .collect();

        let messages = request
            .messages
            .into_iter()
            .map(|m| MessageBody {
                role: match m.role {
                    LlmRole::User => "user",
                    LlmRole::Assistant => "assistant",
                },
                content: m.content,
            })
            .collect();

        MessagesRequest {
            model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system,
            messages,
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            stream: true,
        }
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Request(format!("HTTP request failed: {}", e))
    }
}

#[async_trait::async_trait]
impl LlmService for AnthropicService {
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError> {
        let body = self.build_body(request);
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            model = %body.model,
            max_tokens = %body.max_tokens,
            messages = body.messages.len(),
            "Sending Anthropic streaming request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            // Try to parse as API error
            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_body) {
                return Err(LlmError::Response(format!(
                    "Anthropic API error ({}): {}",
                    error_response.error.error_type, error_response.error.message
                )));
            }

            return Err(LlmError::Response(format!(
                "Anthropic API returned {}: {}",
                status, error_body
            )));
        }

        let mut bytes = Box::pin(response.bytes_stream());

        let events = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for payload in decoder.push(&chunk) {
                            yield Ok(normalize_event(&payload));
                        }
                    }
                    Err(e) => {
                        yield Err(match transport_error(e) {
                            LlmError::Request(msg) => LlmError::Stream(msg),
                            other => other,
                        });
                        return;
                    }
                }
            }
            if let Some(payload) = decoder.finish() {
                yield Ok(normalize_event(&payload));
            }
        };

        Ok(Box::pin(events))
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
