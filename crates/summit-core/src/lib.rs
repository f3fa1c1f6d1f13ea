// crates/summit-core/src/lib.rs
//
// summit-core: Canonical types, money arithmetic, errors, events, and
// collaborator traits for the Summit progression ledger.
//
// This is the leaf crate the rest of the workspace depends on. It defines
// the fixed-point SMT amount, the persisted record shapes, the error
// taxonomy, and the trait interfaces to the external persistence and
// notification collaborators.

pub mod amount;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use summit_core::Amount;`

// Money
pub use amount::{Amount, Grains, GRAINS_PER_SMT};

// Records and value types
pub use types::{
    BalancePatch, BalanceRecord, CompletionReceipt, TaskAssignment, TaskCatalog, TaskDefinition,
    TaskKind, TaskNumber, TaskPatch, TaskStatus, TransferReceipt, UserId, Verdict,
    VerificationContext, YieldReceipt,
};

// Events
pub use events::{LevelUpEvent, TaskCompletionSummary};

// Error type
pub use error::SummitError;

// Traits
pub use traits::{Notifier, ProgressStore};
