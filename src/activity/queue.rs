//! Background queue for fire-and-forget inserts
//!
//! Callers hand entries over without waiting. A single worker receives them
//! over a bounded channel and runs every insert as its own task in a
//! [`JoinSet`], which is the error boundary: store errors and panics are
//! observed there, traced, and counted. Nothing is reported back to the
//! caller. Entries may land in the store out of submission order.
//!
//! At most `capacity` inserts run at once. While that many are in flight
//! the worker stops receiving, the channel fills, and further entries are
//! dropped.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinError, JoinSet},
};
use tracing::{debug, warn};

use crate::{
    activity::ActivityLogEntry,
    error::{AppError, Result},
    storage::{Ack, AppendOnlyStore},
};

enum Job {
    Insert { table: Arc<str>, entry: ActivityLogEntry },
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    persisted: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Snapshot of the queue counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStats {
    /// Entries accepted onto the queue
    pub submitted: u64,
    /// Entries the store acknowledged
    pub persisted: u64,
    /// Entries whose insert failed or panicked
    pub failed: u64,
    /// Entries refused because the queue was full or closed
    pub dropped: u64,
}

/// Handle to the insert worker. Clones feed the same worker, which stops
/// once every handle is dropped and in-flight inserts have finished.
#[derive(Clone)]
pub struct ActivityQueue {
    sender: mpsc::Sender<Job>,
    counters: Arc<Counters>,
}

impl ActivityQueue {
    /// Start the worker on the current tokio runtime. `capacity` bounds both
    /// the entries waiting on the channel and the inserts running at once.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn(store: Arc<dyn AppendOnlyStore>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let counters = Arc::new(Counters::default());
        tokio::spawn(run_worker(store, receiver, counters.clone(), capacity));
        Self { sender, counters }
    }

    /// Hand `entry` to the worker without waiting. Returns `false` when the
    /// entry was dropped.
    pub fn enqueue(&self, table: Arc<str>, entry: ActivityLogEntry) -> bool {
        let entry_type = entry.entry_type.clone();
        match self.sender.try_send(Job::Insert { table, entry }) {
            Ok(()) => {
                self.counters.submitted.fetch_add(1, Ordering::SeqCst);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::SeqCst);
                warn!(entry_type = %entry_type, "Activity queue full, entry dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::SeqCst);
                warn!(entry_type = %entry_type, "Activity queue closed, entry dropped");
                false
            }
        }
    }

    /// Wait until every entry submitted before this call has finished,
    /// successfully or not. Cancels nothing.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.sender.send(Job::Flush(done)).await.is_err() {
            return;
        }
        let _ = finished.await;
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            submitted: self.counters.submitted.load(Ordering::SeqCst),
            persisted: self.counters.persisted.load(Ordering::SeqCst),
            failed: self.counters.failed.load(Ordering::SeqCst),
            dropped: self.counters.dropped.load(Ordering::SeqCst),
        }
    }
}

type InsertOutcome = (String, Result<Ack>);

async fn run_worker(
    store: Arc<dyn AppendOnlyStore>,
    mut receiver: mpsc::Receiver<Job>,
    counters: Arc<Counters>,
    max_inflight: usize,
) {
    debug!(store = store.name(), max_inflight, "Activity queue started");
    let mut inflight: JoinSet<InsertOutcome> = JoinSet::new();

    loop {
        tokio::select! {
            job = receiver.recv(), if inflight.len() < max_inflight => match job {
                Some(Job::Insert { table, entry }) => {
                    let store = store.clone();
                    inflight.spawn(async move {
                        let entry_type = entry.entry_type.clone();
                        let result = match serde_json::to_value(&entry) {
                            Ok(record) => store.insert(&table, record).await,
                            Err(e) => Err(AppError::from(e)),
                        };
                        (entry_type, result)
                    });
                }
                Some(Job::Flush(done)) => {
                    while let Some(joined) = inflight.join_next().await {
                        observe(&counters, joined);
                    }
                    let _ = done.send(());
                }
                None => break,
            },
            Some(joined) = inflight.join_next(), if !inflight.is_empty() => observe(&counters, joined),
        }
    }

    while let Some(joined) = inflight.join_next().await {
        observe(&counters, joined);
    }
    debug!("Activity queue stopped");
}

fn observe(counters: &Counters, joined: std::result::Result<InsertOutcome, JoinError>) {
    match joined {
        Ok((entry_type, Ok(_))) => {
            counters.persisted.fetch_add(1, Ordering::SeqCst);
            debug!(entry_type = %entry_type, "Activity entry persisted");
        }
        Ok((entry_type, Err(e))) => {
            counters.failed.fetch_add(1, Ordering::SeqCst);
            warn!(
                entry_type = %entry_type,
                error = %e,
                kind = %e.category(),
                code = e.code().as_deref().unwrap_or("-"),
                retriable = e.is_retriable(),
                "Activity insert failed"
            );
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::SeqCst);
            warn!(error = %e, panicked = e.is_panic(), "Activity insert task did not complete");
        }
    }
}
