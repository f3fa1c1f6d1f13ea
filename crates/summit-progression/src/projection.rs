// crates/summit-progression/src/projection.rs
//
// Compound growth projection for the core balance.
//
// Projects a starting balance forward under daily compounding plus a
// constant daily external reward (a daily annuity), and inversely solves
// for the day count needed to reach a target via bisection. These are
// what-if calculations for display; they never mutate ledger state, so
// they work in f64 rather than grains.

use serde::{Deserialize, Serialize};

use summit_core::error::SummitError;

/// Search ceiling for the inverse solve: 100 years of days.
pub const MAX_PROJECTION_DAYS: f64 = 36_525.0;

/// Absolute tolerance (in SMT) at which the bisection probe is considered
/// to have hit the target.
const TARGET_TOLERANCE: f64 = 1e-2;

/// Average days per year used for multi-year horizons.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// One point of a year-by-year projection series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Whole years from now.
    pub year: u32,
    /// Day offset of this point (`year * 365.25`).
    pub days: f64,
    /// Projected core balance in SMT.
    pub core: f64,
}

/// Project the core balance `days` from now.
///
/// Combines compound growth of the initial balance,
/// `start * (1 + rate)^days`, with the future value of a daily annuity of
/// `daily_reward` compounding at the same rate. `days` is continuous;
/// fractional values (years x 365.25) are fine.
///
/// A non-positive `daily_rate` would make the annuity term divide by zero,
/// so it falls back to linear growth `start + daily_reward * days`.
pub fn project_core_at_day(
    start_core: f64,
    daily_reward: f64,
    daily_rate: f64,
    days: f64,
) -> f64 {
    if daily_rate <= 0.0 {
        return start_core + daily_reward * days;
    }
    let growth = (1.0 + daily_rate).powf(days);
    start_core * growth + daily_reward * ((growth - 1.0) / daily_rate)
}

/// Number of days until the projected core balance reaches `target`,
/// searching up to [`MAX_PROJECTION_DAYS`].
///
/// See [`days_to_reach_target_within`].
pub fn days_to_reach_target(
    target: f64,
    start_core: f64,
    daily_reward: f64,
    daily_rate: f64,
) -> Result<u32, SummitError> {
    days_to_reach_target_within(target, start_core, daily_reward, daily_rate, MAX_PROJECTION_DAYS)
}

/// Number of days until the projected core balance reaches `target`,
/// searching up to `max_days`.
///
/// Bisects over `[0, max_days]` using [`project_core_at_day`] as the
/// probe, which is strictly increasing in `days` for a positive rate or
/// reward. Stops when the probe lands within 0.01 SMT of the target or
/// the bracket collapses below one day, and returns the upper bound of
/// the final bracket, so a target unreachable within `max_days` yields
/// `max_days` itself.
///
/// # Errors
/// `SummitError::InvalidParameter` if `target <= start_core`.
pub fn days_to_reach_target_within(
    target: f64,
    start_core: f64,
    daily_reward: f64,
    daily_rate: f64,
    max_days: f64,
) -> Result<u32, SummitError> {
    if target <= start_core {
        return Err(SummitError::InvalidParameter(format!(
            "Target {} must exceed the starting core balance {}",
            target, start_core
        )));
    }

    let mut lo = 0.0_f64;
    let mut hi = max_days;
    while hi - lo > 1.0 {
        let mid = (lo + hi) / 2.0;
        let probe = project_core_at_day(start_core, daily_reward, daily_rate, mid);
        if (probe - target).abs() <= TARGET_TOLERANCE {
            return Ok(mid.ceil() as u32);
        }
        if probe < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(hi.ceil() as u32)
}

/// Year-by-year projection series for the calculator screen.
pub fn projection_points(
    start_core: f64,
    daily_reward: f64,
    daily_rate: f64,
    years: u32,
) -> Vec<ProjectionPoint> {
    (1..=years)
        .map(|year| {
            let days = year as f64 * DAYS_PER_YEAR;
            ProjectionPoint {
                year,
                days,
                core: project_core_at_day(start_core, daily_reward, daily_rate, days),
            }
        })
        .collect()
}
