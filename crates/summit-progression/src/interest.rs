// crates/summit-progression/src/interest.rs
//
// Daily yield on the core balance and its reinvestment split.
//
// Yield is computed at a fixed daily rate configured at the system
// boundary. The split between reinvestment (core) and payout (wallet) is
// computed in integer grains so the two portions always sum exactly to
// the total; the wallet side takes the flooring remainder.

use serde::{Deserialize, Serialize};

use summit_core::amount::Amount;
use summit_core::error::SummitError;

/// Default daily yield rate on the core balance: ~26% APY compounded daily.
pub const DEFAULT_DAILY_RATE: f64 = 0.000633;

/// Lowest admissible reinvestment percentage.
pub const MIN_REINVEST_PCT: u8 = 50;

/// Highest admissible reinvestment percentage.
pub const MAX_REINVEST_PCT: u8 = 100;

/// The two portions of one day's yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldSplit {
    /// Portion reinvested into the core balance.
    pub to_core: Amount,
    /// Portion paid out to the wallet.
    pub to_wallet: Amount,
}

/// Validate a reinvestment percentage against the admissible range.
///
/// # Errors
/// `SummitError::InvalidParameter` if `pct` is outside
/// [`MIN_REINVEST_PCT`, `MAX_REINVEST_PCT`].
pub fn validate_reinvest_pct(pct: u8) -> Result<(), SummitError> {
    if !(MIN_REINVEST_PCT..=MAX_REINVEST_PCT).contains(&pct) {
        return Err(SummitError::InvalidParameter(format!(
            "Reinvest percentage {} is outside the admissible range [{}, {}]",
            pct, MIN_REINVEST_PCT, MAX_REINVEST_PCT
        )));
    }
    Ok(())
}

/// Compute one day's yield on a core balance at the given daily rate,
/// rounded to the nearest grain.
pub fn daily_yield(core: Amount, daily_rate: f64) -> Amount {
    Amount::from_grains((core.grains as f64 * daily_rate).round() as u64)
}

/// Split a total yield between core reinvestment and wallet payout.
///
/// The core portion is `total * pct / 100` floored to the grain; the
/// wallet portion is the exact remainder, so
/// `to_core + to_wallet == total` always holds.
///
/// # Errors
/// `SummitError::InvalidParameter` if `reinvest_pct` is out of range.
pub fn split_yield(total: Amount, reinvest_pct: u8) -> Result<YieldSplit, SummitError> {
    validate_reinvest_pct(reinvest_pct)?;

    // u128 intermediate: grains * 100 can exceed u64 at extreme balances.
    let to_core = (total.grains as u128 * reinvest_pct as u128 / 100) as u64;
    let to_core = Amount::from_grains(to_core);
    let to_wallet = total - to_core;

    Ok(YieldSplit { to_core, to_wallet })
}
