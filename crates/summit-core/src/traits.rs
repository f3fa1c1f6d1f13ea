// crates/summit-core/src/traits.rs

use async_trait::async_trait;

use crate::amount::Amount;
use crate::error::SummitError;
use crate::events::{LevelUpEvent, TaskCompletionSummary};
use crate::types::{
    BalancePatch, BalanceRecord, CompletionReceipt, TaskAssignment, TaskNumber, TaskPatch, UserId,
};

/// Trait for the persistence collaborator holding balance and
/// task-assignment records.
///
/// Implemented by summit-store (in-memory and RocksDB backends).
///
/// Writes are conditional: they succeed only if the record's stored
/// version still equals `expected_version`, and fail with
/// `SummitError::Conflict` otherwise. Callers run a read-compute-write
/// loop, re-reading on conflict. Every operation here is a suspension
/// point; all other Summit computation is synchronous.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Read a user's balance record. `Ok(None)` if the user has never
    /// been onboarded.
    async fn read_balance(&self, user: UserId) -> Result<Option<BalanceRecord>, SummitError>;

    /// Conditionally apply a patch to a user's balance record and return
    /// the updated record.
    ///
    /// # Errors
    /// `NotFound` if the user has no balance record; `Conflict` if the
    /// stored version no longer equals `expected_version`.
    async fn write_balance(
        &self,
        user: UserId,
        expected_version: u64,
        patch: BalancePatch,
    ) -> Result<BalanceRecord, SummitError>;

    /// Create the onboarding balance record for a new user.
    ///
    /// Called by the onboarding collaborator, never by the ledger.
    ///
    /// # Errors
    /// `InvalidState` if the user already has a balance record.
    async fn create_balance(&self, user: UserId) -> Result<BalanceRecord, SummitError>;

    /// Read a user's assignment for the given task. `Ok(None)` if the
    /// task was never assigned to the user.
    async fn read_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<Option<TaskAssignment>, SummitError>;

    /// Conditionally apply a patch to a task assignment and return the
    /// updated assignment.
    ///
    /// # Errors
    /// `NotFound` if no assignment exists; `Conflict` on version mismatch.
    async fn write_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
        expected_version: u64,
        patch: TaskPatch,
    ) -> Result<TaskAssignment, SummitError>;

    /// Create a fresh `Assigned` record for the given user and task.
    ///
    /// # Errors
    /// `InvalidState` if the assignment already exists.
    async fn create_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<TaskAssignment, SummitError>;

    /// Atomic read-check-write used by task completion.
    ///
    /// In one all-or-nothing step: re-checks that the assignment is still
    /// reward-eligible, marks it `Completed`, and credits `reward` to the
    /// user's core balance. A crash or timeout can never leave the task
    /// completed without its reward, or rewarded while still assigned,
    /// which also makes the operation safe to retry on unknown outcome.
    ///
    /// # Errors
    /// `NotFound` if the assignment or balance record is missing;
    /// `InvalidState` if the assignment is `Completed` or `Failed`.
    async fn complete_and_credit(
        &self,
        user: UserId,
        task: TaskNumber,
        reward: Amount,
    ) -> Result<CompletionReceipt, SummitError>;

    /// List all users with a balance record. Used by the daily yield sweep.
    async fn list_users(&self) -> Result<Vec<UserId>, SummitError>;
}

/// Trait for the notification collaborator (bot messages, modals).
///
/// Delivery is best-effort: callers log failures and move on. A failed
/// notification must never roll back the balance or level change it
/// describes.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a level-up event to the user.
    async fn level_up(&self, event: &LevelUpEvent) -> Result<(), SummitError>;

    /// Deliver a task-completion summary to the user.
    async fn task_completed(&self, summary: &TaskCompletionSummary) -> Result<(), SummitError>;
}
