// crates/summit-ledger/src/levelup.rs
//
// Level watcher: reconciles the persisted level with the core balance and
// emits one-shot level-up events.
//
// The unacknowledged window works like a modal that is already open: while
// a user's event awaits acknowledgement, further level climbs are
// coalesced into the pending entry instead of emitting again. Acknowledging
// releases the window and, if the level climbed meanwhile, emits the
// follow-up. A level-up is deferred, never dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use summit_core::amount::Amount;
use summit_core::error::SummitError;
use summit_core::events::LevelUpEvent;
use summit_core::traits::{Notifier, ProgressStore};
use summit_core::types::{BalancePatch, UserId};
use summit_progression::levels;

use crate::ledger::MAX_COMMIT_ATTEMPTS;

/// One unacknowledged level-up, with the highest level seen while it
/// waited.
struct PendingLevelUp {
    event: LevelUpEvent,
    latest_level: u32,
    latest_core: Amount,
}

/// Observes core-balance changes, persists level increases, and emits
/// acknowledged one-shot level-up events.
pub struct LevelWatcher {
    store: Arc<dyn ProgressStore>,
    notifier: Arc<dyn Notifier>,
    pending: Mutex<HashMap<UserId, PendingLevelUp>>,
}

impl LevelWatcher {
    pub fn new(store: Arc<dyn ProgressStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// React to a core-balance change.
    ///
    /// Computes the level the new balance justifies; if it exceeds the
    /// stored level, persists the new level (re-evaluating against the
    /// freshly-read record on every optimistic retry, so racing observers
    /// produce one persisted update) and emits a `LevelUpEvent`, unless
    /// an event for this user is still unacknowledged, in which case the
    /// climb is coalesced into the pending entry.
    ///
    /// Returns the emitted event, or `None` when nothing fired.
    pub async fn observe(
        &self,
        user: UserId,
        new_core: Amount,
    ) -> Result<Option<LevelUpEvent>, SummitError> {
        let candidate = levels::level_for(new_core);

        let mut attempts = 0;
        let old_level = loop {
            if attempts == MAX_COMMIT_ATTEMPTS {
                return Err(SummitError::Storage(format!(
                    "Level update for user {} exhausted {} attempts under contention",
                    user, MAX_COMMIT_ATTEMPTS
                )));
            }
            attempts += 1;

            let record = self.store.read_balance(user).await?.ok_or_else(|| {
                SummitError::NotFound(format!("No balance record for user {}", user))
            })?;
            if candidate <= record.level {
                return Ok(None);
            }

            let patch = BalancePatch {
                level: Some(candidate),
                ..Default::default()
            };
            match self.store.write_balance(user, record.version, patch).await {
                Ok(_) => break record.level,
                Err(SummitError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        };

        tracing::info!(user, old_level, new_level = candidate, "level up persisted");

        let mut pending = self.pending.lock().await;
        if let Some(entry) = pending.get_mut(&user) {
            // Unacknowledged window: coalesce, emit nothing.
            if candidate > entry.latest_level {
                entry.latest_level = candidate;
                entry.latest_core = new_core;
            }
            return Ok(None);
        }

        let event = LevelUpEvent::new(user, old_level, candidate, new_core);
        pending.insert(
            user,
            PendingLevelUp {
                event: event.clone(),
                latest_level: candidate,
                latest_core: new_core,
            },
        );
        drop(pending);

        // Best-effort delivery; the persisted level stands regardless.
        if let Err(e) = self.notifier.level_up(&event).await {
            tracing::warn!(user, error = %e, "level-up notification failed");
        }
        Ok(Some(event))
    }

    /// Acknowledge the pending event for a user.
    ///
    /// If the level climbed further while the event was pending, emits
    /// the follow-up event covering the accumulated climb (which itself
    /// then awaits acknowledgement). Returns that follow-up, or `None`.
    pub async fn acknowledge(&self, user: UserId) -> Result<Option<LevelUpEvent>, SummitError> {
        let mut pending = self.pending.lock().await;
        let Some(entry) = pending.remove(&user) else {
            return Ok(None);
        };

        if entry.latest_level <= entry.event.new_level {
            return Ok(None);
        }

        let follow_up = LevelUpEvent::new(
            user,
            entry.event.new_level,
            entry.latest_level,
            entry.latest_core,
        );
        pending.insert(
            user,
            PendingLevelUp {
                event: follow_up.clone(),
                latest_level: entry.latest_level,
                latest_core: entry.latest_core,
            },
        );
        drop(pending);

        if let Err(e) = self.notifier.level_up(&follow_up).await {
            tracing::warn!(user, error = %e, "level-up notification failed");
        }
        Ok(Some(follow_up))
    }

    /// True if the user has an unacknowledged level-up event.
    pub async fn has_pending(&self, user: UserId) -> bool {
        self.pending.lock().await.contains_key(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use summit_core::events::TaskCompletionSummary;
    use summit_store::MemoryStore;

    /// Captures delivered events for assertions.
    struct RecordingNotifier {
        level_ups: Mutex<Vec<LevelUpEvent>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                level_ups: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn level_up(&self, event: &LevelUpEvent) -> Result<(), SummitError> {
            self.level_ups.lock().await.push(event.clone());
            Ok(())
        }
        async fn task_completed(
            &self,
            _summary: &TaskCompletionSummary,
        ) -> Result<(), SummitError> {
            Ok(())
        }
    }

    /// A notifier whose deliveries always fail.
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn level_up(&self, _event: &LevelUpEvent) -> Result<(), SummitError> {
            Err(SummitError::Notification("bot unreachable".to_string()))
        }
        async fn task_completed(
            &self,
            _summary: &TaskCompletionSummary,
        ) -> Result<(), SummitError> {
            Err(SummitError::Notification("bot unreachable".to_string()))
        }
    }

    async fn store_with_core(user: UserId, core: Amount, level: u32) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let record = store.create_balance(user).await.unwrap();
        store
            .write_balance(
                user,
                record.version,
                BalancePatch {
                    core: Some(core),
                    level: Some(level),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_crossing_threshold_emits_once() {
        // Stored level 5 (core 60); one yield credit brings core to 70,
        // past the level-6 threshold of 64.
        let store = store_with_core(1, Amount::from_smt(70.0), 5).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let watcher = LevelWatcher::new(store.clone(), notifier.clone());

        let event = watcher.observe(1, Amount::from_smt(70.0)).await.unwrap().unwrap();
        assert_eq!(event.old_level, 5);
        assert_eq!(event.new_level, 6);

        let record = store.read_balance(1).await.unwrap().unwrap();
        assert_eq!(record.level, 6);
        assert_eq!(notifier.level_ups.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_no_event_without_level_change() {
        let store = store_with_core(1, Amount::from_smt(70.0), 6).await;
        let watcher = LevelWatcher::new(store, Arc::new(RecordingNotifier::new()));

        let event = watcher.observe(1, Amount::from_smt(70.0)).await.unwrap();
        assert!(event.is_none());
    }

    #[tokio::test]
    async fn test_level_never_lowered() {
        // Level cache already ahead of what the balance justifies
        let store = store_with_core(1, Amount::from_smt(10.0), 6).await;
        let watcher = LevelWatcher::new(store.clone(), Arc::new(RecordingNotifier::new()));

        let event = watcher.observe(1, Amount::from_smt(10.0)).await.unwrap();
        assert!(event.is_none());
        assert_eq!(store.read_balance(1).await.unwrap().unwrap().level, 6);
    }

    #[tokio::test]
    async fn test_unacknowledged_window_coalesces() {
        let store = store_with_core(1, Amount::from_smt(70.0), 5).await;
        let notifier = Arc::new(RecordingNotifier::new());
        let watcher = LevelWatcher::new(store.clone(), notifier.clone());

        let first = watcher.observe(1, Amount::from_smt(70.0)).await.unwrap();
        assert!(first.is_some());

        // Core keeps climbing before the user dismisses the modal: the
        // level is persisted but no second event fires.
        let second = watcher.observe(1, Amount::from_smt(300.0)).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.read_balance(1).await.unwrap().unwrap().level, 8);
        assert_eq!(notifier.level_ups.lock().await.len(), 1);

        // Acknowledgement surfaces the accumulated climb as one follow-up.
        let follow_up = watcher.acknowledge(1).await.unwrap().unwrap();
        assert_eq!(follow_up.old_level, 6);
        assert_eq!(follow_up.new_level, 8);

        // And the follow-up itself acknowledges cleanly.
        assert!(watcher.acknowledge(1).await.unwrap().is_none());
        assert!(!watcher.has_pending(1).await);
    }

    #[tokio::test]
    async fn test_acknowledge_without_pending() {
        let store = store_with_core(1, Amount::from_smt(70.0), 5).await;
        let watcher = LevelWatcher::new(store, Arc::new(RecordingNotifier::new()));
        assert!(watcher.acknowledge(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_roll_back() {
        let store = store_with_core(1, Amount::from_smt(70.0), 5).await;
        let watcher = LevelWatcher::new(store.clone(), Arc::new(FailingNotifier));

        let event = watcher.observe(1, Amount::from_smt(70.0)).await.unwrap();
        assert!(event.is_some());
        assert_eq!(store.read_balance(1).await.unwrap().unwrap().level, 6);
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let store = Arc::new(MemoryStore::new());
        for user in [1, 2] {
            let record = store.create_balance(user).await.unwrap();
            store
                .write_balance(
                    user,
                    record.version,
                    BalancePatch {
                        core: Some(Amount::from_smt(70.0)),
                        level: Some(5),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        let watcher = LevelWatcher::new(store, Arc::new(RecordingNotifier::new()));

        assert!(watcher.observe(1, Amount::from_smt(70.0)).await.unwrap().is_some());
        // User 1's pending window does not suppress user 2's event
        assert!(watcher.observe(2, Amount::from_smt(70.0)).await.unwrap().is_some());
    }
}
