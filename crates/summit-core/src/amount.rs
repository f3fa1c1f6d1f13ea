// crates/summit-core/src/amount.rs
//
// SMT token amount and unit constants.
//
// The smallest unit of SMT is the "grain". 1 SMT = 10^8 grains, matching
// the eight fractional digits persisted and displayed throughout the app.
// All internal accounting uses integer grains to avoid floating-point
// precision issues in balance arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Number of grains in one SMT. 1 SMT = 10^8 grains.
pub const GRAINS_PER_SMT: u64 = 100_000_000;

/// Type alias for grains, the smallest unit of SMT.
pub type Grains = u64;

/// An SMT token amount.
///
/// Wraps an amount in grains (the smallest denomination).
/// All arithmetic is performed in integer grains to avoid floating-point errors.
/// Amounts are unsigned: a negative balance is unrepresentable by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// Amount in grains (1 SMT = 10^8 grains).
    pub grains: u64,
}

impl Amount {
    /// Create an Amount from a whole SMT value (as f64), rounded to the
    /// nearest grain.
    ///
    /// # Example
    /// ```
    /// use summit_core::amount::Amount;
    /// let amount = Amount::from_smt(1.5);
    /// assert_eq!(amount.grains, 150_000_000);
    /// ```
    pub fn from_smt(amount: f64) -> Self {
        Self {
            grains: (amount * GRAINS_PER_SMT as f64).round() as u64,
        }
    }

    /// Create an Amount from a grain value.
    pub fn from_grains(grains: u64) -> Self {
        Self { grains }
    }

    /// Convert this amount to SMT as a floating-point value.
    pub fn to_smt(&self) -> f64 {
        self.grains as f64 / GRAINS_PER_SMT as f64
    }

    /// Returns zero SMT.
    pub fn zero() -> Self {
        Self { grains: 0 }
    }

    /// True if this amount is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.grains == 0
    }

    /// Checked addition; `None` on u64 overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.grains.checked_add(rhs.grains).map(Self::from_grains)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            grains: self.grains + rhs.grains,
        }
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            grains: self.grains.saturating_sub(rhs.grains),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.grains / GRAINS_PER_SMT;
        let frac = self.grains % GRAINS_PER_SMT;
        if frac == 0 {
            write!(f, "{} SMT", whole)
        } else {
            // Display up to 8 decimal places, trimming trailing zeros
            let frac_str = format!("{:08}", frac);
            let trimmed = frac_str.trim_end_matches('0');
            write!(f, "{}.{} SMT", whole, trimmed)
        }
    }
}
