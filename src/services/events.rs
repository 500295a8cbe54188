use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::services::store::{BlockStore, StoreError};

/// Change in the block relation between two users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockEvent {
    Blocked { blocker_id: String, blocked_id: String },
    Unblocked { blocker_id: String, blocked_id: String },
}

impl BlockEvent {
    /// Both users whose exclusion sets changed
    pub fn affected_users(&self) -> [&str; 2] {
        match self {
            BlockEvent::Blocked { blocker_id, blocked_id }
            | BlockEvent::Unblocked { blocker_id, blocked_id } => [blocker_id.as_str(), blocked_id.as_str()],
        }
    }
}

const EVENT_CAPACITY: usize = 1024;

/// Writes blocks and broadcasts the change to subscribers
///
/// Events are only sent when the relation actually changed. Having no
/// subscribers is not an error.
#[derive(Clone)]
pub struct BlockService {
    store: Arc<dyn BlockStore>,
    events: broadcast::Sender<BlockEvent>,
}

impl BlockService {
    pub fn new(store: Arc<dyn BlockStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BlockEvent> {
        self.events.subscribe()
    }

    pub async fn block(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError> {
        if blocker_id == blocked_id {
            return Err(StoreError::InvalidInput("a user cannot block themselves".to_string()));
        }

        let created = self.store.insert_block(blocker_id, blocked_id).await?;
        if created {
            tracing::info!(blocker = blocker_id, blocked = blocked_id, "user blocked");
            self.publish(BlockEvent::Blocked {
                blocker_id: blocker_id.to_string(),
                blocked_id: blocked_id.to_string(),
            });
        }
        Ok(created)
    }

    pub async fn unblock(&self, blocker_id: &str, blocked_id: &str) -> Result<bool, StoreError> {
        let removed = self.store.delete_block(blocker_id, blocked_id).await?;
        if removed {
            tracing::info!(blocker = blocker_id, blocked = blocked_id, "user unblocked");
            self.publish(BlockEvent::Unblocked {
                blocker_id: blocker_id.to_string(),
                blocked_id: blocked_id.to_string(),
            });
        }
        Ok(removed)
    }

    fn publish(&self, event: BlockEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("No block event subscribers");
        }
    }
}
