// crates/summit-core/src/types.rs
//
// Canonical persisted records and shared value types for the Summit ledger.
//
// Balance and task-assignment records carry a `version` counter used for
// optimistic conditional writes: a writer reads the record, computes the
// new state, and commits only if the stored version still matches. The
// store bumps the version on every successful write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::amount::Amount;

/// Numeric user identifier (the messenger-assigned id).
pub type UserId = u64;

/// Numeric task/challenge identifier, unique within the task catalog.
pub type TaskNumber = u32;

/// Per-user balance record: the pair of balances, the derived level cache,
/// and the user-chosen reinvestment split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Liquid, transferable funds.
    pub wallet: Amount,
    /// Staked funds; source of daily yield and of the level.
    pub core: Amount,
    /// Persisted cache of the level derived from `core`. May lag behind
    /// what `core` justifies until the level watcher reconciles it, but
    /// never exceeds it.
    pub level: u32,
    /// Fraction of daily yield routed back into core, in percent.
    /// Always within [50, 100].
    pub reinvest_pct: u8,
    /// Optimistic concurrency token. Bumped by the store on each write.
    pub version: u64,
    /// Timestamp of the last successful write.
    pub updated_at: DateTime<Utc>,
}

impl BalanceRecord {
    /// The record created at user onboarding: empty balances, level 0,
    /// full reinvestment.
    pub fn onboarded() -> Self {
        Self {
            wallet: Amount::zero(),
            core: Amount::zero(),
            level: 0,
            reinvest_pct: 100,
            version: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Partial update to a balance record. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalancePatch {
    pub wallet: Option<Amount>,
    pub core: Option<Amount>,
    pub level: Option<u32>,
    pub reinvest_pct: Option<u8>,
}

impl BalancePatch {
    /// Apply this patch to a record in place. Does not touch `version` or
    /// `updated_at`; those are the store's responsibility.
    pub fn apply_to(&self, record: &mut BalanceRecord) {
        if let Some(wallet) = self.wallet {
            record.wallet = wallet;
        }
        if let Some(core) = self.core {
            record.core = core;
        }
        if let Some(level) = self.level {
            record.level = level;
        }
        if let Some(pct) = self.reinvest_pct {
            record.reinvest_pct = pct;
        }
    }
}

/// Lifecycle state of a task assignment.
///
/// `Completed` is terminal for reward purposes: once reached, no further
/// verification or crediting is permitted for that task. `Failed` may be
/// retried and re-enter `Assigned`/`InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// True for the states from which a task may still be completed and
    /// its reward credited.
    pub fn is_reward_eligible(&self) -> bool {
        matches!(self, TaskStatus::Assigned | TaskStatus::InProgress)
    }
}

/// Per-user, per-task assignment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    /// The task this assignment refers to.
    pub task_number: TaskNumber,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Index of the step the user is on, for multi-step tasks.
    pub current_step_index: u32,
    /// Opaque verification attempt history, appended by the pipeline.
    pub progress_details: serde_json::Value,
    /// Optimistic concurrency token. Bumped by the store on each write.
    pub version: u64,
    /// Timestamp of the last successful write.
    pub updated_at: DateTime<Utc>,
}

impl TaskAssignment {
    /// A fresh assignment for the given task, as created at onboarding.
    pub fn assigned(task_number: TaskNumber) -> Self {
        Self {
            task_number,
            status: TaskStatus::Assigned,
            current_step_index: 0,
            progress_details: serde_json::Value::Array(Vec::new()),
            version: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Partial update to a task assignment. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub current_step_index: Option<u32>,
    pub progress_details: Option<serde_json::Value>,
}

impl TaskPatch {
    /// Apply this patch to an assignment in place. Does not touch
    /// `version` or `updated_at`.
    pub fn apply_to(&self, assignment: &mut TaskAssignment) {
        if let Some(status) = self.status {
            assignment.status = status;
        }
        if let Some(idx) = self.current_step_index {
            assignment.current_step_index = idx;
        }
        if let Some(details) = &self.progress_details {
            assignment.progress_details = details.clone();
        }
    }
}

/// The kind of check a task's completion is verified by.
///
/// Each kind maps to a registered verification predicate. Adding a new
/// task type means registering a predicate for its kind, not editing a
/// dispatch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// The user has created at least N goals.
    GoalCount,
    /// The user has exercised the growth calculator.
    CalculatorUsed,
    /// The user's profile carries a display name.
    IdentityPresence,
    /// The user has funded either balance.
    DepositMade,
}

/// Shared, read-only task definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Catalog-unique task number.
    pub number: TaskNumber,
    /// Short human-readable title.
    pub title: String,
    /// Which verification predicate applies.
    pub kind: TaskKind,
    /// Reward credited to the core balance on completion.
    pub reward: Amount,
    /// Opaque parameters interpreted by the predicate
    /// (e.g. `{"min_goals": 2}`).
    pub completion_condition: serde_json::Value,
}

/// In-memory registry of task definitions, immutable at runtime.
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    defs: HashMap<TaskNumber, TaskDefinition>,
}

impl TaskCatalog {
    /// Build a catalog from a list of definitions. A duplicate task number
    /// keeps the last definition.
    pub fn new(defs: Vec<TaskDefinition>) -> Self {
        Self {
            defs: defs.into_iter().map(|d| (d.number, d)).collect(),
        }
    }

    /// Look up a definition by task number.
    pub fn get(&self, number: TaskNumber) -> Option<&TaskDefinition> {
        self.defs.get(&number)
    }

    /// Number of definitions in the catalog.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// True if the catalog holds no definitions.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Immutable snapshot of the user context that verification predicates
/// run against. Assembled by the caller before a verification pass;
/// predicates never read live state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationContext {
    /// Number of goals the user has created.
    pub goal_count: u32,
    /// Whether the user has opened the growth calculator at least once.
    pub growth_calculator_used: bool,
    /// Display name from the user's profile, if set.
    pub profile_name: Option<String>,
    /// Wallet balance at snapshot time.
    pub wallet: Amount,
    /// Core balance at snapshot time.
    pub core: Amount,
}

/// Outcome of a verification predicate: a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub success: bool,
    /// Short human-readable reason, surfaced to the user.
    pub message: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Result of the store's atomic complete-and-credit primitive:
/// the core balance before and after the reward landed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionReceipt {
    pub old_core: Amount,
    pub new_core: Amount,
}

/// Result of a wallet-to-core transfer: both balances after commit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub wallet: Amount,
    pub core: Amount,
}

/// Result of one daily yield application for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldReceipt {
    /// Total yield earned on the core balance this cycle.
    pub total_yield: Amount,
    /// Portion reinvested into core.
    pub to_core: Amount,
    /// Portion paid out to the wallet.
    pub to_wallet: Amount,
    /// Wallet balance after the credit.
    pub new_wallet: Amount,
    /// Core balance after the credit.
    pub new_core: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onboarded_defaults() {
        let record = BalanceRecord::onboarded();
        assert!(record.wallet.is_zero());
        assert!(record.core.is_zero());
        assert_eq!(record.level, 0);
        assert_eq!(record.reinvest_pct, 100);
        assert_eq!(record.version, 0);
    }

    #[test]
    fn test_reward_eligibility() {
        assert!(TaskStatus::Assigned.is_reward_eligible());
        assert!(TaskStatus::InProgress.is_reward_eligible());
        assert!(!TaskStatus::Completed.is_reward_eligible());
        assert!(!TaskStatus::Failed.is_reward_eligible());
    }

    #[test]
    fn test_balance_patch_partial() {
        let mut record = BalanceRecord::onboarded();
        let patch = BalancePatch {
            core: Some(Amount::from_smt(10.0)),
            ..Default::default()
        };
        patch.apply_to(&mut record);
        assert_eq!(record.core, Amount::from_smt(10.0));
        assert!(record.wallet.is_zero());
        assert_eq!(record.reinvest_pct, 100);
    }

    #[test]
    fn test_task_patch_partial() {
        let mut assignment = TaskAssignment::assigned(7);
        let patch = TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        patch.apply_to(&mut assignment);
        assert_eq!(assignment.status, TaskStatus::InProgress);
        assert_eq!(assignment.current_step_index, 0);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = TaskCatalog::new(vec![TaskDefinition {
            number: 1,
            title: "Create two goals".to_string(),
            kind: TaskKind::GoalCount,
            reward: Amount::from_smt(10.0),
            completion_condition: serde_json::json!({"min_goals": 2}),
        }]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(1).is_some());
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_status_serde_tags() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
