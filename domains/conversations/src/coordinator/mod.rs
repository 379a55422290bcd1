//! Streaming turn coordinator
//!
//! Drives one turn end to end: stores the user message, composes the prompt,
//! relays provider fragments to the client, and stores the assembled reply
//! once the provider finishes cleanly. A reply that did not finish cleanly is
//! never written to history.

pub mod envelope;
pub mod locks;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use quizdesk_common::{Error, Result, StateError};
use quizdesk_llm::{CompletionRequest, LlmError, LlmService, StreamEvent};
use quizdesk_questions::QuestionBank;

use crate::domain::entities::{MessageRole, MAX_MESSAGE_LENGTH};
use crate::domain::prompt::PromptComposer;
use crate::domain::state::{TurnEvent, TurnState, TurnStateMachine};
use crate::repository::ConversationStore;

pub use envelope::{StreamEnvelope, GENERIC_ERROR};
pub use locks::{TurnGuard, TurnLocks};

const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_CLIENT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a turn ended in the Erroring state
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("persistence error: {0}")]
    Persistence(#[from] Error),

    #[error("turn timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Tuning for turns
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Upper bound on time spent waiting for prompt inputs and the provider.
    /// Time blocked on a slow client does not count.
    pub timeout: Duration,
    /// Sampling temperature; `None` uses the provider default
    pub temperature: Option<f32>,
    pub channel_capacity: usize,
    /// How long one envelope may wait for room in a full channel before the
    /// client is treated as gone
    pub client_send_timeout: Duration,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TURN_TIMEOUT,
            temperature: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            client_send_timeout: DEFAULT_CLIENT_SEND_TIMEOUT,
        }
    }
}

/// A validated turn submission
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    pub conversation_id: Uuid,
    pub message: String,
}

impl TurnRequest {
    /// Reject missing or blank input before anything is touched
    pub fn new(conversation_id: Option<Uuid>, message: Option<String>) -> Result<Self> {
        let conversation_id = conversation_id
            .ok_or_else(|| Error::Validation("conversation_id is required".to_string()))?;

        let message = message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::Validation("message is required".to_string()))?;

        if message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(Error::Validation(format!(
                "message must be at most {} characters",
                MAX_MESSAGE_LENGTH
            )));
        }

        Ok(Self {
            conversation_id,
            message,
        })
    }
}

/// Forwards envelopes until the client goes away or stops reading
struct Relay {
    tx: mpsc::Sender<StreamEnvelope>,
    send_timeout: Duration,
    client_gone: bool,
}

impl Relay {
    async fn send(&mut self, envelope: StreamEnvelope, conversation_id: Uuid) {
        if self.client_gone {
            return;
        }
        match tokio::time::timeout(self.send_timeout, self.tx.send(envelope)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                self.client_gone = true;
                tracing::info!(
                    conversation_id = %conversation_id,
                    "Client disconnected, finishing turn server-side"
                );
            }
            Err(_) => {
                self.client_gone = true;
                tracing::warn!(
                    conversation_id = %conversation_id,
                    "Client stopped reading, finishing turn server-side"
                );
            }
        }
    }
}

/// Time left for waiting on prompt inputs and the provider
struct ProviderBudget {
    limit: Duration,
    remaining: Duration,
}

impl ProviderBudget {
    fn new(limit: Duration) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }

    /// Await `fut`, charging the wait against the budget
    async fn run<F: Future>(&mut self, fut: F) -> std::result::Result<F::Output, TurnError> {
        let started = Instant::now();
        let output = tokio::time::timeout(self.remaining, fut)
            .await
            .map_err(|_| TurnError::Timeout(self.limit))?;
        self.remaining = self.remaining.saturating_sub(started.elapsed());
        Ok(output)
    }
}

/// One running turn and its lifecycle state
struct Turn {
    request: TurnRequest,
    state: TurnState,
}

impl Turn {
    fn advance(&mut self, event: TurnEvent) -> std::result::Result<(), StateError> {
        let next = TurnStateMachine::transition(self.state, event)?;
        tracing::debug!(
            conversation_id = %self.request.conversation_id,
            from = %self.state,
            to = %next,
            "Turn transition"
        );
        self.state = next;
        Ok(())
    }
}

/// Coordinates streamed turns; cheap to clone
#[derive(Clone)]
pub struct TurnCoordinator {
    store: Arc<dyn ConversationStore>,
    questions: Arc<dyn QuestionBank>,
    llm: Arc<dyn LlmService>,
    composer: PromptComposer,
    locks: TurnLocks,
    settings: TurnSettings,
}

impl TurnCoordinator {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        questions: Arc<dyn QuestionBank>,
        llm: Arc<dyn LlmService>,
    ) -> Self {
        Self {
            store,
            questions,
            llm,
            composer: PromptComposer::default(),
            locks: TurnLocks::new(),
            settings: TurnSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TurnSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn locks(&self) -> &TurnLocks {
        &self.locks
    }

    /// Start a turn and return the receiving end of its event stream.
    ///
    /// Input errors and an unknown conversation are returned before anything is
    /// stored. Once this returns `Ok`, the user message is stored, the
    /// connecting envelope is queued, and every later failure arrives as a
    /// single `error` envelope.
    pub async fn start_turn(&self, request: TurnRequest) -> Result<mpsc::Receiver<StreamEnvelope>> {
        let conversation_id = request.conversation_id;

        self.store
            .find_conversation(conversation_id)
            .await?
            .ok_or_else(|| Error::NotFound("Conversation not found".to_string()))?;

        let guard = self.locks.acquire(conversation_id).await;

        self.store
            .append_message(conversation_id, MessageRole::User, &request.message)
            .await?;

        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        tx.try_send(StreamEnvelope::connecting())
            .map_err(|e| Error::Internal(format!("Failed to open turn channel: {}", e)))?;

        tracing::debug!(conversation_id = %conversation_id, "Turn accepted");

        let turn = Turn {
            request,
            state: TurnState::Connecting,
        };
        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.drive(turn, tx, guard).await;
        });

        Ok(rx)
    }

    async fn drive(self, mut turn: Turn, tx: mpsc::Sender<StreamEnvelope>, _guard: TurnGuard) {
        let conversation_id = turn.request.conversation_id;
        let mut relay = Relay {
            tx,
            send_timeout: self.settings.client_send_timeout,
            client_gone: false,
        };

        let outcome = match self.stream_reply(&mut turn, &mut relay).await {
            Ok(reply) => self.complete(&mut turn, reply).await,
            Err(e) => Err(e),
        };

        let terminal = match outcome {
            Ok(()) => StreamEnvelope::done(),
            Err(e) => {
                tracing::error!(
                    conversation_id = %conversation_id,
                    state = %turn.state,
                    error = %e,
                    "Turn failed"
                );
                if let Err(state_err) = turn.advance(TurnEvent::Failed) {
                    tracing::warn!(error = %state_err, "Unexpected turn state on failure");
                }
                StreamEnvelope::error()
            }
        };

        relay.send(terminal, conversation_id).await;

        if let Err(e) = turn.advance(TurnEvent::Close) {
            tracing::warn!(conversation_id = %conversation_id, error = %e, "Turn did not close cleanly");
        }
    }

    /// Streaming state: relay fragments and accumulate the full reply
    async fn stream_reply(
        &self,
        turn: &mut Turn,
        relay: &mut Relay,
    ) -> std::result::Result<String, TurnError> {
        let conversation_id = turn.request.conversation_id;
        turn.advance(TurnEvent::Opened)?;
        let mut budget = ProviderBudget::new(self.settings.timeout);

        let history = budget.run(self.store.list_messages(conversation_id)).await??;
        let questions = budget.run(self.questions.list_questions()).await??;
        let instructions = budget.run(self.questions.instruction_settings()).await??;
        let documents = budget.run(self.questions.reference_documents()).await??;

        let prompt = self
            .composer
            .compose(instructions.as_ref(), &questions, &documents, &history);

        let request = CompletionRequest {
            model: String::new(),
            system_prompts: prompt.system_prompts(),
            messages: prompt.messages,
            max_tokens: None,
            temperature: self.settings.temperature,
        };

        let mut events = budget.run(self.llm.stream(request)).await??;
        let mut reply = String::new();
        let mut fragments = 0usize;

        while let Some(event) = budget.run(events.next()).await? {
            match event? {
                StreamEvent::Text(text) => {
                    fragments += 1;
                    reply.push_str(&text);
                    relay
                        .send(StreamEnvelope::content(text), conversation_id)
                        .await;
                }
                StreamEvent::Stop => break,
                StreamEvent::Failed(message) => {
                    return Err(TurnError::Provider(LlmError::Stream(message)));
                }
                StreamEvent::Ignored => {}
            }
        }

        tracing::debug!(
            conversation_id = %conversation_id,
            fragments,
            reply_len = reply.len(),
            "Provider stream finished"
        );

        Ok(reply)
    }

    /// Completing state: persist the reply and bump the conversation.
    ///
    /// Once the reply is stored the turn counts as done; a failed
    /// `last_message_at` bump is only logged.
    async fn complete(&self, turn: &mut Turn, reply: String) -> std::result::Result<(), TurnError> {
        let conversation_id = turn.request.conversation_id;
        turn.advance(TurnEvent::Finished)?;

        if reply.trim().is_empty() {
            tracing::warn!(conversation_id = %conversation_id, "Provider returned an empty reply");
            return Ok(());
        }

        self.store
            .append_message(conversation_id, MessageRole::Assistant, &reply)
            .await?;
        if let Err(e) = self.store.touch_conversation(conversation_id).await {
            tracing::warn!(
                conversation_id = %conversation_id,
                error = %e,
                "Reply stored but last_message_at was not updated"
            );
        }

        tracing::info!(
            conversation_id = %conversation_id,
            reply_len = reply.len(),
            "Turn completed"
        );
        Ok(())
    }
}
