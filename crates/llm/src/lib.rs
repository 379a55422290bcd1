//! LLM service: streaming Anthropic Claude API integration
//!
//! The orchestrator only ever talks to `LlmService`. Provider wire formats are
//! decoded by [`sse::SseDecoder`] and folded into the canonical
//! [`events::StreamEvent`] by [`events::normalize_event`].

pub mod anthropic;
pub mod events;
pub mod mock;
pub mod sse;

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use serde::{Deserialize, Serialize};

pub use anthropic::AnthropicService;
pub use events::{normalize_event, StreamEvent};
pub use mock::{MockLlmService, MockStep};
pub use sse::SseDecoder;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Errors raised by LLM providers
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    Response(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Provider timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Speaker of a message in the provider conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

/// One streaming completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Empty string selects the provider default
    pub model: String,
    /// System instruction blocks, sent in order
    pub system_prompts: Vec<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Normalized provider events, in arrival order
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Port implemented by every LLM provider
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Open a streaming completion.
    ///
    /// Errors returned here mean no fragment was produced. Errors yielded by
    /// the stream mean the reply was cut off.
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError>;

    fn default_model(&self) -> &str;
}

/// Provider selection and tuning
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// `anthropic` or `mock`
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl LlmConfig {
    /// Load provider configuration from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "anthropic".to_string());

        let api_key = match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) => key,
            Err(_) if provider == "mock" => String::new(),
            Err(_) => {
                return Err(LlmError::Configuration(
                    "ANTHROPIC_API_KEY is required".to_string(),
                ))
            }
        };

        Ok(Self {
            provider,
            api_key,
            default_model: std::env::var("LLM_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens: parse_env("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            temperature: parse_env("LLM_TEMPERATURE", DEFAULT_TEMPERATURE),
            base_url: std::env::var("LLM_BASE_URL").ok(),
            request_timeout_secs: parse_env(
                "LLM_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: String::new(),
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            base_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Builds the configured `LlmService`
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "anthropic" => {
                tracing::info!(model = %config.default_model, "Using Anthropic LLM provider");
                Ok(Box::new(AnthropicService::new(config)?))
            }
            "mock" => {
                tracing::warn!("Using mock LLM provider");
                Ok(Box::new(MockLlmService::new()))
            }
            other => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}",
                other
            ))),
        }
    }
}
