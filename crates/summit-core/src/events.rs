// crates/summit-core/src/events.rs
//
// Event payloads handed to the notification collaborator.
//
// Events describe state changes that have already committed; delivery is
// best-effort and never rolls back the change it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount::Amount;
use crate::types::{TaskNumber, UserId};

/// Emitted when a user's persisted level rises.
///
/// At most one unacknowledged event exists per user at a time; further
/// level climbs during that window are coalesced by the level watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelUpEvent {
    /// Unique event id.
    pub id: Uuid,
    pub user: UserId,
    pub old_level: u32,
    pub new_level: u32,
    /// Core balance that justified the new level.
    pub core_balance: Amount,
    pub occurred_at: DateTime<Utc>,
}

impl LevelUpEvent {
    pub fn new(user: UserId, old_level: u32, new_level: u32, core_balance: Amount) -> Self {
        Self {
            id: Uuid::now_v7(),
            user,
            old_level,
            new_level,
            core_balance,
            occurred_at: Utc::now(),
        }
    }
}

/// Emitted after a task completes and its reward has been credited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletionSummary {
    pub user: UserId,
    pub task_number: TaskNumber,
    /// Reward credited to the core balance.
    pub reward: Amount,
    /// Core balance before the credit.
    pub old_core: Amount,
    /// Core balance after the credit.
    pub new_core: Amount,
}
