//! State machine for one streamed turn
//!
//! Connecting → Streaming → Completing → Closed, with Erroring → Closed
//! reachable from every non-terminal state.

pub use quizdesk_common::StateError;
use serde::{Deserialize, Serialize};

/// Lifecycle states of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnState {
    Connecting,
    Streaming,
    Completing,
    Erroring,
    Closed,
}

impl TurnState {
    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [TurnState] {
        match self {
            Self::Connecting => &[Self::Streaming, Self::Erroring],
            Self::Streaming => &[Self::Completing, Self::Erroring],
            Self::Completing => &[Self::Closed, Self::Erroring],
            Self::Erroring => &[Self::Closed],
            Self::Closed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Streaming => write!(f, "streaming"),
            Self::Completing => write!(f, "completing"),
            Self::Erroring => write!(f, "erroring"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Events that drive turn state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnEvent {
    /// User message stored and channel open; provider is being called
    Opened,
    /// Provider signalled the end of its reply
    Finished,
    /// Provider error, persistence error, or timeout
    Failed,
    /// Terminal envelope sent
    Close,
}

impl std::fmt::Display for TurnEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opened => write!(f, "opened"),
            Self::Finished => write!(f, "finished"),
            Self::Failed => write!(f, "failed"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// Turn state machine
pub struct TurnStateMachine;

impl TurnStateMachine {
    /// Attempt a state transition
    pub fn transition(current: TurnState, event: TurnEvent) -> Result<TurnState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (current, event) {
            (TurnState::Connecting, TurnEvent::Opened) => TurnState::Streaming,
            (TurnState::Streaming, TurnEvent::Finished) => TurnState::Completing,
            (TurnState::Completing, TurnEvent::Close) | (TurnState::Erroring, TurnEvent::Close) => {
                TurnState::Closed
            }
            (TurnState::Connecting | TurnState::Streaming | TurnState::Completing, TurnEvent::Failed) => {
                TurnState::Erroring
            }
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
