//! Conversations domain: quiz chat history, prompt composition, streamed turns

pub mod api;
pub mod coordinator;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Conversation, Message, MessageRole, MAX_MESSAGE_LENGTH};
pub use domain::progress::{
    ConversationProgress, CoverageDetector, ProgressTracker, SubstringCoverage,
};
pub use domain::prompt::{ComposedPrompt, PromptComposer};
pub use domain::state::{StateError, TurnEvent, TurnState, TurnStateMachine};

// Re-export coordinator types
pub use coordinator::{
    StreamEnvelope, TurnCoordinator, TurnError, TurnLocks, TurnRequest, TurnSettings,
    GENERIC_ERROR,
};

// Re-export repository types
pub use repository::{
    ConversationRepository, ConversationStore, ConversationsRepositories,
    InMemoryConversationStore, MessageRepository,
};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
