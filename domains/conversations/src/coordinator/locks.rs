//! Per-conversation turn serialization
//!
//! Turns for the same conversation run one at a time; turns for different
//! conversations never contend. Entries are removed once nobody holds or
//! waits on them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct TurnLocks {
    inner: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn is running for `conversation_id`
    pub async fn acquire(&self, conversation_id: Uuid) -> TurnGuard {
        let lock = self
            .inner
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;

        TurnGuard {
            guard: Some(guard),
            conversation_id,
            locks: self.clone(),
        }
    }

    /// Number of conversations with a running or waiting turn
    pub fn active(&self) -> usize {
        self.inner.len()
    }
}

/// Held for the whole lifetime of a turn
#[derive(Debug)]
pub struct TurnGuard {
    guard: Option<OwnedMutexGuard<()>>,
    conversation_id: Uuid,
    locks: TurnLocks,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own reference left: nobody holds or waits
        self.locks
            .inner
            .remove_if(&self.conversation_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
