//! Pipeline testing framework
//!
//! Test doubles for the pipeline's collaborators and a harness that wires
//! them together the way [`Pipeline`](crate::pipeline::Pipeline) does, while
//! keeping a handle on each double.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    activity::{ActivityLogger, ActivityQueue},
    config::DEFAULT_ANONYMOUS_LABEL,
    error::{
        AppError, Result,
        reporter::{Notice, Notifier},
    },
    identity::{Identity, SessionIdentity},
    services::{ErrorHandler, ErrorService},
    storage::{Ack, AppendOnlyStore, MemoryStore},
};

pub const TABLE: &str = "activity_logs";

/// Notifier that keeps every notice it receives
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Store that panics on entries whose details contain `explode`, and
/// otherwise forwards to an inner memory store
#[derive(Debug, Clone, Default)]
pub struct PanickingStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl AppendOnlyStore for PanickingStore {
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<Ack> {
        let details = record.get("details").and_then(|d| d.as_str()).unwrap_or_default();
        if details.contains("explode") {
            panic!("store exploded while inserting {details}");
        }
        self.inner.insert(table, record).await
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

/// Store that waits before accepting each insert
#[derive(Debug, Clone, Default)]
pub struct SlowStore {
    pub inner: MemoryStore,
    pub delay: Duration,
}

#[async_trait]
impl AppendOnlyStore for SlowStore {
    async fn insert(&self, table: &str, record: serde_json::Value) -> Result<Ack> {
        tokio::time::sleep(self.delay).await;
        self.inner.insert(table, record).await
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Store that is never reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineStore;

#[async_trait]
impl AppendOnlyStore for OfflineStore {
    async fn insert(&self, _table: &str, _record: serde_json::Value) -> Result<Ack> {
        Err(AppError::external_service("connection refused"))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

pub fn trader() -> Identity {
    Identity::new("user-42", "trader@example.com")
}

/// The pipeline wired to test doubles
pub struct Harness {
    pub store: MemoryStore,
    pub session: SessionIdentity,
    pub notifier: Arc<RecordingNotifier>,
    pub queue: ActivityQueue,
    pub activity: ActivityLogger,
    pub service: ErrorService,
}

impl Harness {
    /// Signed-out session, recording memory store
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    /// Signed-out session writing to `store`
    pub fn with_store(store: MemoryStore) -> Self {
        let backend: Arc<dyn AppendOnlyStore> = Arc::new(store.clone());
        Self::wire(store, backend, 64)
    }

    /// Signed-out session writing to an arbitrary backend. The returned
    /// `store` field stays empty.
    pub fn with_backend(backend: Arc<dyn AppendOnlyStore>, capacity: usize) -> Self {
        Self::wire(MemoryStore::new(), backend, capacity)
    }

    fn wire(store: MemoryStore, backend: Arc<dyn AppendOnlyStore>, capacity: usize) -> Self {
        crate::logging::init();
        let session = SessionIdentity::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let queue = ActivityQueue::spawn(backend, capacity);
        let activity = ActivityLogger::new(queue.clone(), Arc::new(session.clone()), TABLE, DEFAULT_ANONYMOUS_LABEL);
        let service = ErrorService::new(notifier.clone(), activity.clone());
        Self {
            store,
            session,
            notifier,
            queue,
            activity,
            service,
        }
    }

    pub fn signed_in(self) -> Self {
        self.session.sign_in(trader());
        self
    }

    pub fn handler(&self, scope: &str) -> ErrorHandler {
        ErrorHandler::new(self.service.clone(), scope)
    }

    /// Wait for every queued insert, then return the stored rows
    pub async fn settled_rows(&self) -> Vec<serde_json::Value> {
        self.queue.flush().await;
        self.store.records_in(TABLE)
    }
}
