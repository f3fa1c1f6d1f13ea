// crates/summit-store/src/rocks.rs
//
// RocksDB-backed progress store for single-node deployments.
//
// Key format:
//   - `balance:{user_id}`            -> JSON-serialized BalanceRecord
//   - `task:{user_id}:{task_number}` -> JSON-serialized TaskAssignment
//
// RocksDB has no compare-and-set, so a process-wide commit mutex
// serializes every read-modify-write sequence; the version check then
// only rejects writers holding a record read before their lock turn.
// Multi-record commits (completion) go through a WriteBatch so the
// status flip and the credit land atomically.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{DBWithThreadMode, MultiThreaded, Options, WriteBatch};

use summit_core::amount::Amount;
use summit_core::error::SummitError;
use summit_core::traits::ProgressStore;
use summit_core::types::{
    BalancePatch, BalanceRecord, CompletionReceipt, TaskAssignment, TaskNumber, TaskPatch,
    TaskStatus, UserId,
};

/// RocksDB wrapper implementing the `ProgressStore` trait.
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    commit_lock: Mutex<()>,
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, SummitError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path).map_err(|e| {
            SummitError::Storage(format!("Failed to open RocksDB at {}: {}", path, e))
        })?;

        Ok(Self {
            db,
            commit_lock: Mutex::new(()),
        })
    }

    /// Build the balance key: `balance:{user_id}`.
    fn balance_key(user: UserId) -> Vec<u8> {
        format!("balance:{}", user).into_bytes()
    }

    /// Build the assignment key: `task:{user_id}:{task_number}`.
    fn task_key(user: UserId, task: TaskNumber) -> Vec<u8> {
        format!("task:{}:{}", user, task).into_bytes()
    }

    /// Get raw bytes from RocksDB, mapping errors to SummitError::Storage.
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SummitError> {
        self.db
            .get(key)
            .map_err(|e| SummitError::Storage(format!("RocksDB get failed: {}", e)))
    }

    /// Put raw bytes into RocksDB, mapping errors to SummitError::Storage.
    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), SummitError> {
        self.db
            .put(key, value)
            .map_err(|e| SummitError::Storage(format!("RocksDB put failed: {}", e)))
    }

    fn get_balance_sync(&self, user: UserId) -> Result<Option<BalanceRecord>, SummitError> {
        match self.get_raw(&Self::balance_key(user))? {
            Some(bytes) => {
                let record: BalanceRecord = serde_json::from_slice(&bytes)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn get_assignment_sync(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<Option<TaskAssignment>, SummitError> {
        match self.get_raw(&Self::task_key(user, task))? {
            Some(bytes) => {
                let assignment: TaskAssignment = serde_json::from_slice(&bytes)?;
                Ok(Some(assignment))
            }
            None => Ok(None),
        }
    }

    fn put_balance_sync(&self, user: UserId, record: &BalanceRecord) -> Result<(), SummitError> {
        let json = serde_json::to_vec(record)?;
        self.put_raw(&Self::balance_key(user), &json)
    }

    fn put_assignment_sync(
        &self,
        user: UserId,
        assignment: &TaskAssignment,
    ) -> Result<(), SummitError> {
        let json = serde_json::to_vec(assignment)?;
        self.put_raw(&Self::task_key(user, assignment.task_number), &json)
    }

    fn lock_commits(&self) -> Result<std::sync::MutexGuard<'_, ()>, SummitError> {
        self.commit_lock
            .lock()
            .map_err(|_| SummitError::Storage("Commit lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProgressStore for RocksStore {
    async fn read_balance(&self, user: UserId) -> Result<Option<BalanceRecord>, SummitError> {
        self.get_balance_sync(user)
    }

    async fn write_balance(
        &self,
        user: UserId,
        expected_version: u64,
        patch: BalancePatch,
    ) -> Result<BalanceRecord, SummitError> {
        let _guard = self.lock_commits()?;

        let mut record = self
            .get_balance_sync(user)?
            .ok_or_else(|| SummitError::NotFound(format!("No balance record for user {}", user)))?;
        if record.version != expected_version {
            return Err(SummitError::Conflict(format!(
                "Balance version {} does not match expected {}",
                record.version, expected_version
            )));
        }

        patch.apply_to(&mut record);
        record.version += 1;
        record.updated_at = Utc::now();
        self.put_balance_sync(user, &record)?;
        Ok(record)
    }

    async fn create_balance(&self, user: UserId) -> Result<BalanceRecord, SummitError> {
        let _guard = self.lock_commits()?;

        if self.get_balance_sync(user)?.is_some() {
            return Err(SummitError::InvalidState(format!(
                "User {} already has a balance record",
                user
            )));
        }
        let record = BalanceRecord::onboarded();
        self.put_balance_sync(user, &record)?;
        Ok(record)
    }

    async fn read_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<Option<TaskAssignment>, SummitError> {
        self.get_assignment_sync(user, task)
    }

    async fn write_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
        expected_version: u64,
        patch: TaskPatch,
    ) -> Result<TaskAssignment, SummitError> {
        let _guard = self.lock_commits()?;

        let mut assignment = self.get_assignment_sync(user, task)?.ok_or_else(|| {
            SummitError::NotFound(format!("Task {} is not assigned to user {}", task, user))
        })?;
        if assignment.version != expected_version {
            return Err(SummitError::Conflict(format!(
                "Assignment version {} does not match expected {}",
                assignment.version, expected_version
            )));
        }

        patch.apply_to(&mut assignment);
        assignment.version += 1;
        assignment.updated_at = Utc::now();
        self.put_assignment_sync(user, &assignment)?;
        Ok(assignment)
    }

    async fn create_assignment(
        &self,
        user: UserId,
        task: TaskNumber,
    ) -> Result<TaskAssignment, SummitError> {
        let _guard = self.lock_commits()?;

        if self.get_assignment_sync(user, task)?.is_some() {
            return Err(SummitError::InvalidState(format!(
                "Task {} is already assigned to user {}",
                task, user
            )));
        }
        let assignment = TaskAssignment::assigned(task);
        self.put_assignment_sync(user, &assignment)?;
        Ok(assignment)
    }

    async fn complete_and_credit(
        &self,
        user: UserId,
        task: TaskNumber,
        reward: Amount,
    ) -> Result<CompletionReceipt, SummitError> {
        let _guard = self.lock_commits()?;

        let mut assignment = self.get_assignment_sync(user, task)?.ok_or_else(|| {
            SummitError::NotFound(format!("Task {} is not assigned to user {}", task, user))
        })?;
        if !assignment.status.is_reward_eligible() {
            return Err(SummitError::InvalidState(format!(
                "Task {} is not eligible for completion (status {:?})",
                task, assignment.status
            )));
        }
        let mut record = self
            .get_balance_sync(user)?
            .ok_or_else(|| SummitError::NotFound(format!("No balance record for user {}", user)))?;

        let now = Utc::now();
        assignment.status = TaskStatus::Completed;
        assignment.version += 1;
        assignment.updated_at = now;

        let old_core = record.core;
        record.core = record.core + reward;
        record.version += 1;
        record.updated_at = now;

        // One WriteBatch: the status flip and the credit land together
        // or not at all.
        let mut batch = WriteBatch::default();
        batch.put(Self::task_key(user, task), serde_json::to_vec(&assignment)?);
        batch.put(Self::balance_key(user), serde_json::to_vec(&record)?);
        self.db
            .write(batch)
            .map_err(|e| SummitError::Storage(format!("RocksDB batch write failed: {}", e)))?;

        Ok(CompletionReceipt {
            old_core,
            new_core: record.core,
        })
    }

    async fn list_users(&self) -> Result<Vec<UserId>, SummitError> {
        let prefix = b"balance:";
        let mut users = Vec::new();

        let iter = self.db.prefix_iterator(prefix);
        for item in iter {
            let (key, _value) = item
                .map_err(|e| SummitError::Storage(format!("RocksDB iteration error: {}", e)))?;

            // Keys are `balance:{user_id}`. Stop when the prefix no longer matches.
            if !key.starts_with(prefix) {
                break;
            }

            let id_bytes = &key[prefix.len()..];
            let id_str = std::str::from_utf8(id_bytes).unwrap_or("");
            if let Ok(user) = id_str.parse::<UserId>() {
                users.push(user);
            }
        }

        users.sort_unstable();
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temporary directory path using UUID to avoid conflicts.
    fn temp_db_path(label: &str) -> String {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("summit_test_{}_{}", label, Uuid::now_v7()));
        path.to_string_lossy().to_string()
    }

    #[tokio::test]
    async fn test_balance_roundtrip() {
        let store = RocksStore::open(&temp_db_path("balance")).unwrap();
        store.create_balance(1).await.unwrap();

        let updated = store
            .write_balance(
                1,
                0,
                BalancePatch {
                    core: Some(Amount::from_smt(100.0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.version, 1);

        let read_back = store.read_balance(1).await.unwrap().unwrap();
        assert_eq!(read_back.core, Amount::from_smt(100.0));
    }

    #[tokio::test]
    async fn test_stale_write_conflicts() {
        let store = RocksStore::open(&temp_db_path("conflict")).unwrap();
        store.create_balance(1).await.unwrap();
        store
            .write_balance(
                1,
                0,
                BalancePatch {
                    wallet: Some(Amount::from_smt(5.0)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = store
            .write_balance(
                1,
                0,
                BalancePatch {
                    wallet: Some(Amount::from_smt(99.0)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(SummitError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_complete_and_credit_batch() {
        let store = RocksStore::open(&temp_db_path("complete")).unwrap();
        store.create_balance(1).await.unwrap();
        store.create_assignment(1, 7).await.unwrap();

        let receipt = store
            .complete_and_credit(1, 7, Amount::from_smt(10.0))
            .await
            .unwrap();
        assert_eq!(receipt.new_core, Amount::from_smt(10.0));

        let assignment = store.read_assignment(1, 7).await.unwrap().unwrap();
        assert_eq!(assignment.status, TaskStatus::Completed);

        // Completed is terminal
        let result = store.complete_and_credit(1, 7, Amount::from_smt(10.0)).await;
        assert!(matches!(result, Err(SummitError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_list_users() {
        let store = RocksStore::open(&temp_db_path("list")).unwrap();
        for user in [3, 1, 2] {
            store.create_balance(user).await.unwrap();
        }
        assert_eq!(store.list_users().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let path = temp_db_path("reopen");
        {
            let store = RocksStore::open(&path).unwrap();
            store.create_balance(1).await.unwrap();
            store
                .write_balance(
                    1,
                    0,
                    BalancePatch {
                        core: Some(Amount::from_smt(64.0)),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let store = RocksStore::open(&path).unwrap();
        let record = store.read_balance(1).await.unwrap().unwrap();
        assert_eq!(record.core, Amount::from_smt(64.0));
        assert_eq!(record.version, 1);
    }
}
