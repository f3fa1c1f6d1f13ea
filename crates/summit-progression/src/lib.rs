// crates/summit-progression/src/lib.rs
//
// summit-progression: level thresholds, daily yield, and compound growth
// projection for the Summit ledger.
//
// Everything here is pure and synchronous: lookups and arithmetic over
// the caller's snapshot of the balances. Yield and split amounts are
// integer grains; projections are display-grade f64.

pub mod interest;
pub mod levels;
pub mod projection;

// Re-export key items for ergonomic access from downstream crates.
pub use interest::{
    daily_yield, split_yield, validate_reinvest_pct, YieldSplit, DEFAULT_DAILY_RATE,
    MAX_REINVEST_PCT, MIN_REINVEST_PCT,
};
pub use levels::{level_for, required_core_for, MAX_TABLE_LEVEL};
pub use projection::{
    days_to_reach_target, days_to_reach_target_within, project_core_at_day, projection_points,
    ProjectionPoint, DAYS_PER_YEAR, MAX_PROJECTION_DAYS,
};
