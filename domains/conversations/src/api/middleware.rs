//! Conversations domain state

use std::sync::Arc;

use quizdesk_questions::QuestionBank;

use crate::coordinator::TurnCoordinator;
use crate::domain::progress::ProgressTracker;
use crate::repository::ConversationStore;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub store: Arc<dyn ConversationStore>,
    pub questions: Arc<dyn QuestionBank>,
    pub coordinator: TurnCoordinator,
    pub tracker: ProgressTracker,
}

impl ConversationsState {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        questions: Arc<dyn QuestionBank>,
        coordinator: TurnCoordinator,
    ) -> Self {
        Self {
            store,
            questions,
            coordinator,
            tracker: ProgressTracker::default(),
        }
    }
}
