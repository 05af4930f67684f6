//! Claim change notifications
//!
//! Stores publish a `ClaimEvent` after every successful write. Viewers
//! subscribe and get only the events they are allowed to see, so the admin
//! review screen and a member's own claim list follow the same stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use core_kernel::ClaimId;
use crate::actor::Actor;
use crate::claim::ClaimStatus;

/// A committed change to a claim record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaimEvent {
    Created {
        claim_id: ClaimId,
        owner: String,
        timestamp: DateTime<Utc>,
    },
    Updated {
        claim_id: ClaimId,
        owner: String,
        status: Option<ClaimStatus>,
        timestamp: DateTime<Utc>,
    },
    Deleted {
        claim_id: ClaimId,
        owner: String,
        timestamp: DateTime<Utc>,
    },
}

impl ClaimEvent {
    pub fn claim_id(&self) -> ClaimId {
        match self {
            ClaimEvent::Created { claim_id, .. }
            | ClaimEvent::Updated { claim_id, .. }
            | ClaimEvent::Deleted { claim_id, .. } => *claim_id,
        }
    }

    pub fn owner(&self) -> &str {
        match self {
            ClaimEvent::Created { owner, .. }
            | ClaimEvent::Updated { owner, .. }
            | ClaimEvent::Deleted { owner, .. } => owner,
        }
    }

    /// Admins see every event, members only those on their own claims
    pub fn is_visible_to(&self, actor: &Actor) -> bool {
        actor.is_admin() || self.owner().trim().eq_ignore_ascii_case(actor.identity.trim())
    }
}

/// Fan-out channel stores publish into
#[derive(Debug, Clone)]
pub struct ClaimEventBus {
    sender: broadcast::Sender<ClaimEvent>,
}

impl ClaimEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes to current subscribers; a bus nobody listens to drops the event
    pub fn publish(&self, event: ClaimEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClaimEvent> {
        self.sender.subscribe()
    }
}

impl Default for ClaimEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A subscription filtered to what one actor may see
#[derive(Debug)]
pub struct ClaimWatch {
    actor: Actor,
    receiver: broadcast::Receiver<ClaimEvent>,
}

impl ClaimWatch {
    pub fn new(actor: Actor, receiver: broadcast::Receiver<ClaimEvent>) -> Self {
        Self { actor, receiver }
    }

    /// Waits for the next visible event; `None` once the store is gone
    ///
    /// A slow consumer that falls behind loses the oldest events and keeps
    /// going from the oldest one still buffered.
    pub async fn next(&mut self) -> Option<ClaimEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.is_visible_to(&self.actor) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, identity = %self.actor.identity, "claim watcher lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns an already-buffered visible event without waiting
    pub fn try_next(&mut self) -> Option<ClaimEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.is_visible_to(&self.actor) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
