// crates/summit-daemon/src/sweeper.rs
//
// Daily yield sweep: the single periodic actor of the system.
//
// Each tick applies one day's yield to every user and feeds the new core
// balances to the level watcher. Per-user failures are logged and
// skipped; a transient storage error heals on the next tick because
// yield application is validated and atomic per user.

use std::sync::Arc;
use std::time::Duration;

use summit_core::traits::ProgressStore;
use summit_ledger::{BalanceLedger, LevelWatcher};

/// Periodically applies daily yield across all users.
pub struct YieldSweeper {
    store: Arc<dyn ProgressStore>,
    ledger: Arc<BalanceLedger>,
    watcher: Arc<LevelWatcher>,
    interval: Duration,
    daily_rate: f64,
}

impl YieldSweeper {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        ledger: Arc<BalanceLedger>,
        watcher: Arc<LevelWatcher>,
        interval: Duration,
        daily_rate: f64,
    ) -> Self {
        Self {
            store,
            ledger,
            watcher,
            interval,
            daily_rate,
        }
    }

    /// Run the sweep loop until ctrl-c.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            daily_rate = self.daily_rate,
            "yield sweeper started"
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("yield sweeper received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {
                    self.sweep().await;
                }
            }
        }

        Ok(())
    }

    /// Apply one day's yield to every user.
    pub async fn sweep(&self) {
        let users = match self.store.list_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "yield sweep could not list users");
                return;
            }
        };

        let mut credited = 0usize;
        let mut level_ups = 0usize;
        for &user in &users {
            match self.ledger.apply_daily_yield(user, self.daily_rate).await {
                Ok(receipt) => {
                    if !receipt.total_yield.is_zero() {
                        credited += 1;
                    }
                    match self.watcher.observe(user, receipt.new_core).await {
                        Ok(Some(_)) => level_ups += 1,
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(user, error = %e, "level observation failed");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(user, error = %e, "daily yield failed for user");
                }
            }
        }

        tracing::info!(
            users = users.len(),
            credited,
            level_ups,
            "yield sweep complete"
        );
    }
}
