// crates/summit-ledger/tests/progression_flow.rs
//
// End-to-end tests for the progression flow: onboarding-shaped records,
// wallet funding, staking, task completion, yield distribution, and
// level-up events, wired together over the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use summit_core::amount::Amount;
use summit_core::error::SummitError;
use summit_core::events::{LevelUpEvent, TaskCompletionSummary};
use summit_core::traits::{Notifier, ProgressStore};
use summit_core::types::{TaskCatalog, TaskDefinition, TaskKind, VerificationContext};
use summit_ledger::{BalanceLedger, LevelWatcher, PredicateRegistry, TaskPipeline};
use summit_progression::{level_for, DEFAULT_DAILY_RATE};
use summit_store::MemoryStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Captures every delivered event for assertions.
struct RecordingNotifier {
    level_ups: Mutex<Vec<LevelUpEvent>>,
    completions: Mutex<Vec<TaskCompletionSummary>>,
}

impl RecordingNotifier {
    fn new() -> Self {
        Self {
            level_ups: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn level_up(&self, event: &LevelUpEvent) -> Result<(), SummitError> {
        self.level_ups.lock().await.push(event.clone());
        Ok(())
    }

    async fn task_completed(&self, summary: &TaskCompletionSummary) -> Result<(), SummitError> {
        self.completions.lock().await.push(summary.clone());
        Ok(())
    }
}

fn catalog() -> TaskCatalog {
    TaskCatalog::new(vec![
        TaskDefinition {
            number: 1,
            title: "Create two goals".to_string(),
            kind: TaskKind::GoalCount,
            reward: Amount::from_smt(10.0),
            completion_condition: serde_json::json!({"min_goals": 2}),
        },
        TaskDefinition {
            number: 2,
            title: "Fund your wallet".to_string(),
            kind: TaskKind::DepositMade,
            reward: Amount::from_smt(5.0),
            completion_condition: serde_json::json!({}),
        },
    ])
}

struct Harness {
    store: Arc<MemoryStore>,
    ledger: BalanceLedger,
    pipeline: TaskPipeline,
    watcher: LevelWatcher,
    notifier: Arc<RecordingNotifier>,
}

async fn harness_with_user(user: u64) -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.create_balance(user).await.unwrap();
    store.create_assignment(user, 1).await.unwrap();
    store.create_assignment(user, 2).await.unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    Harness {
        ledger: BalanceLedger::new(store.clone()),
        pipeline: TaskPipeline::new(
            store.clone(),
            catalog(),
            PredicateRegistry::with_builtins(),
            notifier.clone(),
        ),
        watcher: LevelWatcher::new(store.clone(), notifier.clone()),
        store,
        notifier,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_deposit_stake_and_reach_level_six() {
    let h = harness_with_user(1).await;

    h.ledger.top_up_wallet(1, Amount::from_smt(100.0)).await.unwrap();
    let receipt = h
        .ledger
        .transfer_wallet_to_core(1, Amount::from_smt(100.0))
        .await
        .unwrap();
    assert!(receipt.wallet.is_zero());
    assert_eq!(receipt.core, Amount::from_smt(100.0));

    // 100 SMT clears the 64 threshold but not 125
    assert_eq!(level_for(receipt.core), 6);

    let event = h.watcher.observe(1, receipt.core).await.unwrap().unwrap();
    assert_eq!(event.old_level, 0);
    assert_eq!(event.new_level, 6);
    assert_eq!(h.store.read_balance(1).await.unwrap().unwrap().level, 6);
}

#[tokio::test]
async fn test_task_reward_credits_core_exactly_once() {
    let h = harness_with_user(1).await;

    let ctx = VerificationContext {
        goal_count: 3,
        ..Default::default()
    };
    let outcome = h.pipeline.verify_and_complete(1, 1, &ctx).await.unwrap();
    assert!(outcome.verdict.success);
    let summary = outcome.completion.unwrap();
    assert_eq!(summary.reward, Amount::from_smt(10.0));
    assert!(summary.old_core.is_zero());
    assert_eq!(summary.new_core, Amount::from_smt(10.0));

    // Retrying the same task changes nothing
    let retry = h.pipeline.verify_and_complete(1, 1, &ctx).await;
    assert!(matches!(retry, Err(SummitError::InvalidState(_))));
    let record = h.store.read_balance(1).await.unwrap().unwrap();
    assert_eq!(record.core, Amount::from_smt(10.0));

    assert_eq!(h.notifier.completions.lock().await.len(), 1);
}

#[tokio::test]
async fn test_failed_verification_then_funded_retry() {
    let h = harness_with_user(1).await;

    // The deposit challenge fails while both balances are empty
    let empty = VerificationContext::default();
    let outcome = h.pipeline.verify_and_complete(1, 2, &empty).await.unwrap();
    assert!(!outcome.verdict.success);
    assert!(outcome.completion.is_none());

    // Fund the wallet and retry with a fresh snapshot
    h.ledger.top_up_wallet(1, Amount::from_smt(20.0)).await.unwrap();
    let record = h.ledger.balance(1).await.unwrap();
    let funded = VerificationContext {
        wallet: record.wallet,
        core: record.core,
        ..Default::default()
    };
    let outcome = h.pipeline.verify_and_complete(1, 2, &funded).await.unwrap();
    assert!(outcome.verdict.success);
    assert_eq!(
        outcome.completion.unwrap().new_core,
        Amount::from_smt(5.0)
    );
}

#[tokio::test]
async fn test_yield_accrues_and_splits_per_user_preference() {
    let h = harness_with_user(1).await;

    h.ledger.top_up_wallet(1, Amount::from_smt(2_000.0)).await.unwrap();
    h.ledger
        .transfer_wallet_to_core(1, Amount::from_smt(2_000.0))
        .await
        .unwrap();
    h.ledger.set_reinvest_percentage(1, 50).await.unwrap();

    let receipt = h.ledger.apply_daily_yield(1, DEFAULT_DAILY_RATE).await.unwrap();
    assert_eq!(receipt.total_yield, Amount::from_smt(1.266));
    assert_eq!(receipt.to_core + receipt.to_wallet, receipt.total_yield);
    assert_eq!(receipt.new_core, Amount::from_smt(2_000.633));
    assert_eq!(receipt.new_wallet, Amount::from_smt(0.633));
}

#[tokio::test]
async fn test_level_ups_coalesce_until_acknowledged() {
    let h = harness_with_user(1).await;

    // First stake: level 0 -> 5
    h.ledger.top_up_wallet(1, Amount::from_smt(1_000.0)).await.unwrap();
    let first = h
        .ledger
        .transfer_wallet_to_core(1, Amount::from_smt(32.0))
        .await
        .unwrap();
    let event = h.watcher.observe(1, first.core).await.unwrap().unwrap();
    assert_eq!(event.new_level, 5);

    // More staking before the modal is dismissed: persisted, not emitted
    let second = h
        .ledger
        .transfer_wallet_to_core(1, Amount::from_smt(500.0))
        .await
        .unwrap();
    assert!(h.watcher.observe(1, second.core).await.unwrap().is_none());
    assert_eq!(h.store.read_balance(1).await.unwrap().unwrap().level, 9);
    assert_eq!(h.notifier.level_ups.lock().await.len(), 1);

    // Acknowledgement surfaces the rest of the climb
    let follow_up = h.watcher.acknowledge(1).await.unwrap().unwrap();
    assert_eq!(follow_up.old_level, 5);
    assert_eq!(follow_up.new_level, 9);
    assert!(h.watcher.acknowledge(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_insufficient_transfer_leaves_everything_untouched() {
    let h = harness_with_user(1).await;

    h.ledger.top_up_wallet(1, Amount::from_smt(30.0)).await.unwrap();
    let before = h.ledger.balance(1).await.unwrap();

    let result = h.ledger.transfer_wallet_to_core(1, Amount::from_smt(50.0)).await;
    assert!(matches!(result, Err(SummitError::InsufficientFunds(_))));

    let after = h.ledger.balance(1).await.unwrap();
    assert_eq!(before.wallet, after.wallet);
    assert_eq!(before.core, after.core);
    assert_eq!(before.version, after.version);
}

#[tokio::test]
async fn test_balances_stay_non_negative_across_operation_mix() {
    let h = harness_with_user(1).await;

    h.ledger.top_up_wallet(1, Amount::from_smt(10.0)).await.unwrap();
    h.ledger.transfer_wallet_to_core(1, Amount::from_smt(10.0)).await.unwrap();
    let _ = h.ledger.transfer_wallet_to_core(1, Amount::from_smt(1.0)).await;
    h.ledger.apply_daily_yield(1, DEFAULT_DAILY_RATE).await.unwrap();
    h.pipeline.complete_task(1, 2).await.unwrap();

    let record = h.ledger.balance(1).await.unwrap();
    // Amounts are unsigned; what we are really checking is that the
    // operation mix kept the books consistent.
    assert!(record.core >= Amount::from_smt(15.0));
    assert!(record.wallet <= Amount::from_smt(10.0));
}
