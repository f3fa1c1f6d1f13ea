// crates/summit-store/src/memory.rs
//
// In-memory progress store for tests and development.
//
// A stand-in for the hosted backend: HashMaps behind a tokio RwLock,
// with the same conditional-write contract the hosted API provides.
// Conditional writes compare the caller's expected version against the
// stored one and fail with `Conflict` on mismatch; the completion
// primitive does its read-check-write inside a single write-lock scope,
// so the status flip and the credit are indivisible.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use summit_core::amount::Amount;
use summit_core::error::SummitError;
use summit_core::traits::ProgressStore;
use summit_core::types::{
    BalancePatch, BalanceRecord, CompletionReceipt, TaskAssignment, TaskNumber, TaskPatch, UserId,
};

#[derive(Default)]
struct Inner {
    balances: HashMap<UserId, BalanceRecord>,
    assignments: HashMap<(UserId, TaskNumber), TaskAssignment>,
}

/// In-memory `ProgressStore` implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn read_balance(&self, user: UserId) -> Result<Option<BalanceRecord>, SummitError> {
        Ok(self.inner.read().await.balances.get(&user).cloned())
    }

    async fn write_balance(
        &self,
        user: UserId,
        expected_version: u64,
        patch: BalancePatch,
    ) -> Result<BalanceRecord, SummitError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .balances
            .get_mut(&user)
            .ok_or_else(|| SummitError::NotFound(format!("No balance record for user {}", user)))?;

        if record.version != expected_version {
            return Err(SummitError::Conflict(format!(
                "Balance version {} does not match expected {}",
                record.version, expected_version
            )));
        }

        patch.apply_to(record);
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn create_balance(&self, user: UserId) -> Result<BalanceRecord, SummitError> {
        let mut inner = self.inner.write().await;
        if inner.balances.contains_key(&user) {
            return Err(SummitError::InvalidState(format!(
                "User {} already has a balance record",
                user
            )));
        }
        let record = BalanceRecord::onboarded();
        inner.balances.insert(user, record.clone());
        Ok(record)
    }

    async fn read_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<Option<TaskAssignment>, SummitError> {
        Ok(self.inner.read().await.assignments.get(&(user, task)).cloned())
    }

    async fn write_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
        expected_version: u64,
        patch: TaskPatch,
    ) -> Result<TaskAssignment, SummitError> {
        let mut inner = self.inner.write().await;
        let assignment = inner.assignments.get_mut(&(user, task)).ok_or_else(|| {
            SummitError::NotFound(format!("Task {} is not assigned to user {}", task, user))
        })?;

        if assignment.version != expected_version {
            return Err(SummitError::Conflict(format!(
                "Assignment version {} does not match expected {}",
                assignment.version, expected_version
            )));
        }

        patch.apply_to(assignment);
        assignment.version += 1;
        assignment.updated_at = Utc::now();
        Ok(assignment.clone())
    }

    async fn create_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<TaskAssignment, SummitError> {
        let mut inner = self.inner.write().await;
        if inner.assignments.contains_key(&(user, task)) {
            return Err(SummitError::InvalidState(format!(
                "Task {} is already assigned to user {}",
                task, user
            )));
        }
        let assignment = TaskAssignment::assigned(task);
        inner.assignments.insert((user, task), assignment.clone());
        Ok(assignment)
    }

    async fn complete_and_credit(
        &self,
        user: UserId,
        task: TaskNumber,
        reward: Amount,
    ) -> Result<CompletionReceipt, SummitError> {
        // Single write-lock scope: the eligibility re-check, the status
        // flip, and the credit are indivisible.
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let assignment = inner.assignments.get_mut(&(user, task)).ok_or_else(|| {
            SummitError::NotFound(format!("Task {} is not assigned to user {}", task, user))
        })?;
        if !assignment.status.is_reward_eligible() {
            return Err(SummitError::InvalidState(format!(
                "Task {} is not eligible for completion (status {:?})",
                task, assignment.status
            )));
        }
        let record = inner
            .balances
            .get_mut(&user)
            .ok_or_else(|| SummitError::NotFound(format!("No balance record for user {}", user)))?;

        // Both records checked; mutate together.
        assignment.status = summit_core::types::TaskStatus::Completed;
        assignment.version += 1;
        assignment.updated_at = Utc::now();

        let old_core = record.core;
        record.core = record.core + reward;
        record.version += 1;
        record.updated_at = Utc::now();

        Ok(CompletionReceipt {
            old_core,
            new_core: record.core,
        })
    }

    async fn list_users(&self) -> Result<Vec<UserId>, SummitError> {
        let mut users: Vec<UserId> = self.inner.read().await.balances.keys().copied().collect();
        users.sort_unstable();
        Ok(users)
    }
}
