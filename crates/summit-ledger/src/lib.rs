// crates/summit-ledger/src/lib.rs
//
// summit-ledger: the stateful core of the Summit progression ledger.
//
// Three components share the store's versioned records:
//   - BalanceLedger: sole writer of the wallet/core balance pair
//   - TaskPipeline:  verification predicates and at-most-once crediting
//   - LevelWatcher:  level reconciliation and one-shot level-up events

pub mod ledger;
pub mod levelup;
pub mod tasks;

// Re-export key types for ergonomic access from downstream crates.
pub use ledger::BalanceLedger;
pub use levelup::LevelWatcher;
pub use tasks::{
    CalculatorUsedPredicate, DepositMadePredicate, GoalCountPredicate, IdentityPresencePredicate,
    PredicateRegistry, TaskOutcome, TaskPipeline, VerificationPredicate,
};
