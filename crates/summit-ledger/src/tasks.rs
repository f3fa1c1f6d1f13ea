// crates/summit-ledger/src/tasks.rs
//
// Task verification and completion pipeline.
//
// Verification is a pure predicate over a context snapshot, selected by
// the task's kind through a registry: adding a task type means
// registering a predicate, not extending a dispatch chain. A negative
// verdict is a normal result surfaced to the user, never an error.
//
// Completion goes through the store's atomic complete-and-credit
// primitive, which re-checks eligibility inside the same step that flips
// the status and credits the reward. That re-check is what makes a retry
// after an unknown-outcome timeout safe: the second attempt either finds
// the task already completed (`InvalidState`) or completes it cleanly.
// The reward lands on the core balance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use summit_core::error::SummitError;
use summit_core::events::TaskCompletionSummary;
use summit_core::traits::{Notifier, ProgressStore};
use summit_core::types::{
    TaskAssignment, TaskCatalog, TaskDefinition, TaskKind, TaskNumber, TaskPatch, TaskStatus,
    UserId, Verdict, VerificationContext,
};

use crate::ledger::MAX_COMMIT_ATTEMPTS;

/// A pure completion check for one task kind.
///
/// Implementations read only the definition's `completion_condition` and
/// the supplied context snapshot; they must not touch live state.
pub trait VerificationPredicate: Send + Sync {
    fn verify(&self, def: &TaskDefinition, ctx: &VerificationContext) -> Verdict;
}

/// Passes once the user has created at least `min_goals` goals
/// (condition `{"min_goals": n}`, default 2).
pub struct GoalCountPredicate;

impl VerificationPredicate for GoalCountPredicate {
    fn verify(&self, def: &TaskDefinition, ctx: &VerificationContext) -> Verdict {
        let min_goals = def
            .completion_condition
            .get("min_goals")
            .and_then(|v| v.as_u64())
            .unwrap_or(2) as u32;
        if ctx.goal_count >= min_goals {
            Verdict::pass(format!("You have {} goals", ctx.goal_count))
        } else {
            Verdict::fail(format!(
                "Create at least {} goals; you have {} so far",
                min_goals, ctx.goal_count
            ))
        }
    }
}

/// Passes once the user has opened the growth calculator.
pub struct CalculatorUsedPredicate;

impl VerificationPredicate for CalculatorUsedPredicate {
    fn verify(&self, _def: &TaskDefinition, ctx: &VerificationContext) -> Verdict {
        if ctx.growth_calculator_used {
            Verdict::pass("Growth calculator used")
        } else {
            Verdict::fail("Open the growth calculator and run a projection first")
        }
    }
}

/// Passes when the user's profile carries a non-empty display name.
pub struct IdentityPresencePredicate;

impl VerificationPredicate for IdentityPresencePredicate {
    fn verify(&self, _def: &TaskDefinition, ctx: &VerificationContext) -> Verdict {
        match ctx.profile_name.as_deref() {
            Some(name) if !name.trim().is_empty() => {
                Verdict::pass(format!("Welcome, {}", name.trim()))
            }
            _ => Verdict::fail("Set a display name on your profile first"),
        }
    }
}

/// Passes once either balance has been funded.
pub struct DepositMadePredicate;

impl VerificationPredicate for DepositMadePredicate {
    fn verify(&self, _def: &TaskDefinition, ctx: &VerificationContext) -> Verdict {
        if ctx.wallet.is_zero() && ctx.core.is_zero() {
            Verdict::fail("Fund your wallet to complete this challenge")
        } else {
            Verdict::pass("Balance funded")
        }
    }
}

/// Strategy lookup from task kind to verification predicate.
pub struct PredicateRegistry {
    predicates: HashMap<TaskKind, Box<dyn VerificationPredicate>>,
}

impl PredicateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// A registry with all built-in predicates registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(TaskKind::GoalCount, Box::new(GoalCountPredicate));
        registry.register(TaskKind::CalculatorUsed, Box::new(CalculatorUsedPredicate));
        registry.register(TaskKind::IdentityPresence, Box::new(IdentityPresencePredicate));
        registry.register(TaskKind::DepositMade, Box::new(DepositMadePredicate));
        registry
    }

    /// Register (or replace) the predicate for a task kind.
    pub fn register(&mut self, kind: TaskKind, predicate: Box<dyn VerificationPredicate>) {
        self.predicates.insert(kind, predicate);
    }

    fn get(&self, kind: TaskKind) -> Option<&dyn VerificationPredicate> {
        self.predicates.get(&kind).map(|p| p.as_ref())
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Result of a verify-and-complete pass: the verdict, and the completion
/// summary when the verdict passed.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub verdict: Verdict,
    pub completion: Option<TaskCompletionSummary>,
}

/// Verifies tasks against context snapshots and completes them with
/// at-most-once reward crediting.
pub struct TaskPipeline {
    store: Arc<dyn ProgressStore>,
    catalog: TaskCatalog,
    registry: PredicateRegistry,
    notifier: Arc<dyn Notifier>,
}

impl TaskPipeline {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        catalog: TaskCatalog,
        registry: PredicateRegistry,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            catalog,
            registry,
            notifier,
        }
    }

    /// Run the verification predicate for a task against a context
    /// snapshot. Pure and synchronous; a failed check is a normal
    /// `Verdict` with `success: false`.
    ///
    /// # Errors
    /// `NotFound` if the task is not in the catalog or its kind has no
    /// registered predicate.
    pub fn verify(
        &self,
        task: TaskNumber,
        ctx: &VerificationContext,
    ) -> Result<Verdict, SummitError> {
        let def = self.definition(task)?;
        let predicate = self.registry.get(def.kind).ok_or_else(|| {
            SummitError::NotFound(format!("No predicate registered for {:?}", def.kind))
        })?;
        Ok(predicate.verify(def, ctx))
    }

    /// Move an assignment to `InProgress` (from `Assigned`, or from
    /// `Failed` on retry).
    ///
    /// # Errors
    /// `InvalidState` if the task is already completed.
    pub async fn start_task(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<TaskAssignment, SummitError> {
        self.commit_assignment(user, task, |assignment| {
            if assignment.status == TaskStatus::Completed {
                return Err(SummitError::InvalidState(format!(
                    "Task {} is already completed",
                    task
                )));
            }
            Ok(TaskPatch {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            })
        })
        .await
    }

    /// Append a verification attempt to the assignment's history.
    ///
    /// A failed attempt marks the assignment `Failed` (retryable); a
    /// passing attempt moves it to `InProgress` pending completion.
    ///
    /// # Errors
    /// `InvalidState` if the task is already completed; no further
    /// attempts are permitted.
    pub async fn record_attempt(
        &self,
        user: UserId,
        task: TaskNumber,
        verdict: &Verdict,
    ) -> Result<TaskAssignment, SummitError> {
        let entry = serde_json::json!({
            "at": Utc::now(),
            "success": verdict.success,
            "message": verdict.message,
        });

        self.commit_assignment(user, task, move |assignment| {
            if assignment.status == TaskStatus::Completed {
                return Err(SummitError::InvalidState(format!(
                    "Task {} is already completed",
                    task
                )));
            }
            let mut history = match &assignment.progress_details {
                serde_json::Value::Array(entries) => entries.clone(),
                other if other.is_null() => Vec::new(),
                other => vec![other.clone()],
            };
            history.push(entry.clone());

            let status = if verdict.success {
                TaskStatus::InProgress
            } else {
                TaskStatus::Failed
            };
            Ok(TaskPatch {
                status: Some(status),
                progress_details: Some(serde_json::Value::Array(history)),
                ..Default::default()
            })
        })
        .await
    }

    /// Complete a task and credit its reward to the core balance, at most
    /// once per (user, task).
    ///
    /// The status pre-check here fails fast on stale UI retries; the
    /// authoritative check happens inside the store's atomic
    /// `complete_and_credit` step.
    ///
    /// # Errors
    /// `NotFound` for an unknown task or missing assignment;
    /// `InvalidState` if the assignment is not `Assigned`/`InProgress`.
    pub async fn complete_task(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<TaskCompletionSummary, SummitError> {
        let def = self.definition(task)?;
        let assignment = self.load_assignment(user, task).await?;
        if !assignment.status.is_reward_eligible() {
            return Err(SummitError::InvalidState(format!(
                "Task {} is not eligible for completion (status {:?})",
                task, assignment.status
            )));
        }

        let receipt = self.store.complete_and_credit(user, task, def.reward).await?;
        let summary = TaskCompletionSummary {
            user,
            task_number: task,
            reward: def.reward,
            old_core: receipt.old_core,
            new_core: receipt.new_core,
        };

        tracing::info!(
            user,
            task,
            reward = %summary.reward,
            new_core = %summary.new_core,
            "task completed"
        );
        // Best-effort delivery; the credit stands regardless.
        if let Err(e) = self.notifier.task_completed(&summary).await {
            tracing::warn!(user, task, error = %e, "task completion notification failed");
        }
        Ok(summary)
    }

    /// The single "check task" flow: verify against the snapshot, record
    /// the attempt, and complete on success.
    pub async fn verify_and_complete(
        &self,
        user: UserId,
        task: TaskNumber,
        ctx: &VerificationContext,
    ) -> Result<TaskOutcome, SummitError> {
        let verdict = self.verify(task, ctx)?;
        self.record_attempt(user, task, &verdict).await?;

        if !verdict.success {
            return Ok(TaskOutcome {
                verdict,
                completion: None,
            });
        }
        let summary = self.complete_task(user, task).await?;
        Ok(TaskOutcome {
            verdict,
            completion: Some(summary),
        })
    }

    fn definition(&self, task: TaskNumber) -> Result<&TaskDefinition, SummitError> {
        self.catalog
            .get(task)
            .ok_or_else(|| SummitError::NotFound(format!("Task {} is not in the catalog", task)))
    }

    async fn load_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<TaskAssignment, SummitError> {
        self.store.read_assignment(user, task).await?.ok_or_else(|| {
            SummitError::NotFound(format!("Task {} is not assigned to user {}", task, user))
        })
    }

    /// Optimistic commit loop over a task assignment, mirroring the
    /// balance ledger's.
    async fn commit_assignment<F>(
        &self,
        user: UserId,
        task: TaskNumber,
        build: F,
    ) -> Result<TaskAssignment, SummitError>
    where
        F: Fn(&TaskAssignment) -> Result<TaskPatch, SummitError>,
    {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let assignment = self.load_assignment(user, task).await?;
            let patch = build(&assignment)?;
            match self
                .store
                .write_assignment(user, task, assignment.version, patch)
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(SummitError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(SummitError::Storage(format!(
            "Assignment commit for user {} task {} exhausted {} attempts under contention",
            user, task, MAX_COMMIT_ATTEMPTS
        )))
    }
}
