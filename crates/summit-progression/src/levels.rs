// crates/summit-progression/src/levels.rs
//
// Level threshold table: the monotonic mapping from core balance to level.
//
// Thresholds follow the progression curve of the app:
//   - Levels 1-6:   powers of two, 2 .. 64 SMT
//   - Levels 7-10:  125, 250, 500, 1000 SMT
//   - Levels 11-30: doubling from 2000 SMT
//
// The table is immutable at runtime. Lookups are linear scans; n = 30.

use summit_core::amount::{Amount, GRAINS_PER_SMT};

/// Highest level present in the threshold table.
pub const MAX_TABLE_LEVEL: u32 = 30;

/// The 30 `(level, required core in grains)` pairs, strictly increasing
/// in both fields.
const LEVEL_THRESHOLDS: [(u32, u64); 30] = [
    (1, 2 * GRAINS_PER_SMT),
    (2, 4 * GRAINS_PER_SMT),
    (3, 8 * GRAINS_PER_SMT),
    (4, 16 * GRAINS_PER_SMT),
    (5, 32 * GRAINS_PER_SMT),
    (6, 64 * GRAINS_PER_SMT),
    (7, 125 * GRAINS_PER_SMT),
    (8, 250 * GRAINS_PER_SMT),
    (9, 500 * GRAINS_PER_SMT),
    (10, 1_000 * GRAINS_PER_SMT),
    (11, 2_000 * GRAINS_PER_SMT),
    (12, 4_000 * GRAINS_PER_SMT),
    (13, 8_000 * GRAINS_PER_SMT),
    (14, 16_000 * GRAINS_PER_SMT),
    (15, 32_000 * GRAINS_PER_SMT),
    (16, 64_000 * GRAINS_PER_SMT),
    (17, 128_000 * GRAINS_PER_SMT),
    (18, 256_000 * GRAINS_PER_SMT),
    (19, 512_000 * GRAINS_PER_SMT),
    (20, 1_024_000 * GRAINS_PER_SMT),
    (21, 2_048_000 * GRAINS_PER_SMT),
    (22, 4_096_000 * GRAINS_PER_SMT),
    (23, 8_192_000 * GRAINS_PER_SMT),
    (24, 16_384_000 * GRAINS_PER_SMT),
    (25, 32_768_000 * GRAINS_PER_SMT),
    (26, 65_536_000 * GRAINS_PER_SMT),
    (27, 131_072_000 * GRAINS_PER_SMT),
    (28, 262_144_000 * GRAINS_PER_SMT),
    (29, 524_288_000 * GRAINS_PER_SMT),
    (30, 1_048_576_000 * GRAINS_PER_SMT),
];

/// Return the highest level whose threshold is at or below `core`,
/// or 0 if the balance is below the first threshold.
///
/// Total and deterministic; `Amount` is unsigned, so a negative balance
/// is unrepresentable and the level-0 floor is structural.
pub fn level_for(core: Amount) -> u32 {
    LEVEL_THRESHOLDS
        .iter()
        .rev()
        .find(|(_, required)| *required <= core.grains)
        .map(|(level, _)| *level)
        .unwrap_or(0)
}

/// Return the core balance required to reach `level`.
///
/// Level 0 requires nothing. Levels beyond the table extrapolate by
/// doubling the last threshold per level step, mirroring the table's own
/// doubling pattern, saturating at `u64::MAX` grains.
pub fn required_core_for(level: u32) -> Amount {
    if level == 0 {
        return Amount::zero();
    }
    if level <= MAX_TABLE_LEVEL {
        let (_, required) = LEVEL_THRESHOLDS[(level - 1) as usize];
        return Amount::from_grains(required);
    }

    let (_, last) = LEVEL_THRESHOLDS[(MAX_TABLE_LEVEL - 1) as usize];
    let mut required = last;
    for _ in MAX_TABLE_LEVEL..level {
        required = required.saturating_mul(2);
    }
    Amount::from_grains(required)
}
