// crates/summit-daemon/src/notify.rs
//
// Tracing-backed Notifier for deployments without a bot transport.
// The production messenger delivery lives outside this workspace; the
// daemon only needs somewhere for events to land.

use async_trait::async_trait;

use summit_core::error::SummitError;
use summit_core::events::{LevelUpEvent, TaskCompletionSummary};
use summit_core::traits::Notifier;

/// Logs every event at info level instead of delivering it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn level_up(&self, event: &LevelUpEvent) -> Result<(), SummitError> {
        tracing::info!(
            user = event.user,
            old_level = event.old_level,
            new_level = event.new_level,
            core = %event.core_balance,
            "level up"
        );
        Ok(())
    }

    async fn task_completed(&self, summary: &TaskCompletionSummary) -> Result<(), SummitError> {
        tracing::info!(
            user = summary.user,
            task = summary.task_number,
            reward = %summary.reward,
            new_core = %summary.new_core,
            "task completed"
        );
        Ok(())
    }
}
