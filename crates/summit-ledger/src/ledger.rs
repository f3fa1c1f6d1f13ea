// crates/summit-ledger/src/ledger.rs
//
// The balance ledger: sole writer of the per-user wallet/core pair.
//
// Every mutation is a read-validate-conditional-write sequence against the
// store's versioned records. A write that loses the optimistic race comes
// back as `Conflict`; the ledger re-reads and retries, so two concurrent
// top-ups both land rather than one silently overwriting the other. This
// replaces the in-process "already called" guards of a single UI session
// with a serialization scope that holds across processes.
//
// Validation happens before any write is attempted: a rejected operation
// leaves both balances untouched.

use std::sync::Arc;

use summit_core::amount::Amount;
use summit_core::error::SummitError;
use summit_core::traits::ProgressStore;
use summit_core::types::{BalancePatch, BalanceRecord, TransferReceipt, UserId, YieldReceipt};
use summit_progression::interest;

/// Attempts before an optimistic commit loop gives up and reports the
/// contention as a transient storage failure.
pub(crate) const MAX_COMMIT_ATTEMPTS: u32 = 8;

/// Owns all mutations of the per-user balance record.
pub struct BalanceLedger {
    store: Arc<dyn ProgressStore>,
}

impl BalanceLedger {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Read a user's current balance record.
    ///
    /// # Errors
    /// `NotFound` if the user was never onboarded.
    pub async fn balance(&self, user: UserId) -> Result<BalanceRecord, SummitError> {
        self.load(user).await
    }

    /// Credit the wallet with a top-up.
    ///
    /// Returns the new wallet balance.
    ///
    /// # Errors
    /// `InvalidAmount` if `amount` is zero (negative amounts are
    /// unrepresentable).
    pub async fn top_up_wallet(&self, user: UserId, amount: Amount) -> Result<Amount, SummitError> {
        if amount.is_zero() {
            return Err(SummitError::InvalidAmount(
                "Top-up amount must be positive".to_string(),
            ));
        }

        let (_, updated) = self
            .commit(user, |record| {
                Ok(BalancePatch {
                    wallet: Some(record.wallet + amount),
                    ..Default::default()
                })
            })
            .await?;

        tracing::debug!(user, amount = %amount, wallet = %updated.wallet, "wallet top-up");
        Ok(updated.wallet)
    }

    /// Move funds from the wallet into the core balance.
    ///
    /// Debit and credit commit in a single conditional write; a partial
    /// transfer is never observable.
    ///
    /// # Errors
    /// `InvalidAmount` if `amount` is zero; `InsufficientFunds` if the
    /// wallet cannot cover it.
    pub async fn transfer_wallet_to_core(
        &self,
        user: UserId,
        amount: Amount,
    ) -> Result<TransferReceipt, SummitError> {
        if amount.is_zero() {
            return Err(SummitError::InvalidAmount(
                "Transfer amount must be positive".to_string(),
            ));
        }

        let (_, updated) = self
            .commit(user, |record| {
                if amount > record.wallet {
                    return Err(SummitError::InsufficientFunds(format!(
                        "Transfer of {} exceeds wallet balance {}",
                        amount, record.wallet
                    )));
                }
                Ok(BalancePatch {
                    wallet: Some(record.wallet - amount),
                    core: Some(record.core + amount),
                    ..Default::default()
                })
            })
            .await?;

        tracing::debug!(user, amount = %amount, core = %updated.core, "wallet-to-core transfer");
        Ok(TransferReceipt {
            wallet: updated.wallet,
            core: updated.core,
        })
    }

    /// Additively credit both balances. Used by yield distribution;
    /// non-negativity of the deltas is structural.
    pub async fn credit_reward(
        &self,
        user: UserId,
        wallet_delta: Amount,
        core_delta: Amount,
    ) -> Result<BalanceRecord, SummitError> {
        let (_, updated) = self
            .commit(user, |record| {
                Ok(BalancePatch {
                    wallet: Some(record.wallet + wallet_delta),
                    core: Some(record.core + core_delta),
                    ..Default::default()
                })
            })
            .await?;
        Ok(updated)
    }

    /// Set the user's reinvestment percentage.
    ///
    /// # Errors
    /// `InvalidParameter` if `pct` is outside [50, 100].
    pub async fn set_reinvest_percentage(
        &self,
        user: UserId,
        pct: u8,
    ) -> Result<BalanceRecord, SummitError> {
        interest::validate_reinvest_pct(pct)?;

        let (_, updated) = self
            .commit(user, |_| {
                Ok(BalancePatch {
                    reinvest_pct: Some(pct),
                    ..Default::default()
                })
            })
            .await?;
        Ok(updated)
    }

    /// Apply one day's yield: compute it on the current core balance,
    /// split it per the user's reinvestment percentage, and credit both
    /// balances in one conditional write.
    ///
    /// A zero yield (empty core) skips the write entirely.
    pub async fn apply_daily_yield(
        &self,
        user: UserId,
        daily_rate: f64,
    ) -> Result<YieldReceipt, SummitError> {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let record = self.load(user).await?;
            let total = interest::daily_yield(record.core, daily_rate);
            let split = interest::split_yield(total, record.reinvest_pct)?;

            if total.is_zero() {
                return Ok(YieldReceipt {
                    total_yield: total,
                    to_core: split.to_core,
                    to_wallet: split.to_wallet,
                    new_wallet: record.wallet,
                    new_core: record.core,
                });
            }

            let patch = BalancePatch {
                wallet: Some(record.wallet + split.to_wallet),
                core: Some(record.core + split.to_core),
                ..Default::default()
            };
            match self.store.write_balance(user, record.version, patch).await {
                Ok(updated) => {
                    tracing::debug!(
                        user,
                        total = %total,
                        to_core = %split.to_core,
                        to_wallet = %split.to_wallet,
                        "daily yield applied"
                    );
                    return Ok(YieldReceipt {
                        total_yield: total,
                        to_core: split.to_core,
                        to_wallet: split.to_wallet,
                        new_wallet: updated.wallet,
                        new_core: updated.core,
                    });
                }
                Err(SummitError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Self::contention(user))
    }

    /// Read the user's record, `NotFound` if absent.
    async fn load(&self, user: UserId) -> Result<BalanceRecord, SummitError> {
        self.store
            .read_balance(user)
            .await?
            .ok_or_else(|| SummitError::NotFound(format!("No balance record for user {}", user)))
    }

    /// Optimistic commit loop: read, build a patch from the fresh record,
    /// attempt the conditional write, and retry on version conflict.
    /// Returns the record the patch was built from and the updated record.
    async fn commit<F>(
        &self,
        user: UserId,
        build: F,
    ) -> Result<(BalanceRecord, BalanceRecord), SummitError>
    where
        F: Fn(&BalanceRecord) -> Result<BalancePatch, SummitError>,
    {
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let record = self.load(user).await?;
            let patch = build(&record)?;
            match self.store.write_balance(user, record.version, patch).await {
                Ok(updated) => return Ok((record, updated)),
                Err(SummitError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Self::contention(user))
    }

    fn contention(user: UserId) -> SummitError {
        SummitError::Storage(format!(
            "Balance commit for user {} exhausted {} attempts under contention",
            user, MAX_COMMIT_ATTEMPTS
        ))
    }
}
