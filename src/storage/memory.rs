//! In-process store, used by tests and as the default backend

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    error::{AppError, Result},
    storage::{Ack, AppendOnlyStore, validate_identifier},
};

/// A record accepted by a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub table: String,
    pub record: serde_json::Value,
}

/// Keeps every accepted record in a `Vec`. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<StoredRecord>>>,
    attempts: Arc<AtomicUsize>,
    reject_all: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every insert, as a store with a permission or
    /// schema problem would
    pub fn failing() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredRecord>> {
        // A panic while holding the lock cannot leave a half-written record
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every accepted record, in the order the inserts completed
    pub fn records(&self) -> Vec<StoredRecord> {
        self.lock().clone()
    }

    /// Accepted records for one table
    pub fn records_in(&self, table: &str) -> Vec<serde_json::Value> {
        self.lock()
            .iter()
            .filter(|stored| stored.table == table)
            .map(|stored| stored.record.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of insert calls, accepted or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppendOnlyStore for MemoryStore {
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<Ack> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        validate_identifier(table)?;
        if self.reject_all {
            return Err(AppError::StoreRejected {
                status: 403,
                body: format!("new row violates row-level security policy for table \"{table}\""),
            });
        }
        if !record.is_object() {
            return Err(AppError::InvalidRecord(format!("expected a JSON object, got {record}")));
        }
        self.lock().push(StoredRecord {
            table: table.to_string(),
            record,
        });
        Ok(Ack::single())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_records_inserts_per_table() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.insert("activity_logs", json!({"type": "visit"})).await.unwrap();
        store.insert("other", json!({"type": "error"})).await.unwrap();

        assert_eq!(handle.len(), 2);
        assert_eq!(handle.records_in("activity_logs"), vec![json!({"type": "visit"})]);
        assert_eq!(handle.attempts(), 2);
    }

    #[tokio::test]
    async fn test_failing_store_rejects_and_counts_attempts() {
        let store = MemoryStore::failing();
        let err = store.insert("activity_logs", json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::StoreRejected { status: 403, .. }));
        assert_eq!(store.attempts(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_objects_and_bad_tables() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.insert("activity_logs", json!([1])).await,
            Err(AppError::InvalidRecord(_))
        ));
        assert!(matches!(
            store.insert("bad table", json!({})).await,
            Err(AppError::InvalidIdentifier(_))
        ));
    }
}
