//! Tests for the background insert queue

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::activity::{ActivityLogEntry, ActivityQueue};
    use crate::storage::{AppendOnlyStore, MemoryStore};
    use crate::tests::framework::{OfflineStore, PanickingStore, SlowStore, TABLE};

    fn entry(details: &str) -> ActivityLogEntry {
        ActivityLogEntry::new("visit", details)
    }

    #[tokio::test]
    async fn test_flush_waits_for_slow_inserts() {
        let store = SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_millis(30),
        };
        let queue = ActivityQueue::spawn(Arc::new(store.clone()), 16);
        for path in ["/a", "/b", "/c"] {
            assert!(queue.enqueue(TABLE.into(), entry(path)));
        }

        queue.flush().await;
        assert_eq!(store.inner.len(), 3);
        assert_eq!(queue.stats().persisted, 3);
    }

    #[tokio::test]
    async fn test_panicking_insert_is_contained() {
        let store = PanickingStore::default();
        let queue = ActivityQueue::spawn(Arc::new(store.clone()), 16);
        queue.enqueue(TABLE.into(), entry("please explode"));
        queue.enqueue(TABLE.into(), entry("Visited /after"));

        queue.flush().await;
        let stats = queue.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.persisted, 1);

        queue.enqueue(TABLE.into(), entry("Visited /later"));
        queue.flush().await;
        assert_eq!(store.inner.len(), 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let store = MemoryStore::new();
        let queue = ActivityQueue::spawn(Arc::new(store.clone()), 2);

        // The worker cannot run until this task yields
        let accepted: Vec<bool> = (0..5).map(|i| queue.enqueue(TABLE.into(), entry(&format!("/{i}")))).collect();
        assert_eq!(accepted, vec![true, true, false, false, false]);

        queue.flush().await;
        let stats = queue.stats();
        assert_eq!(stats.submitted, 2);
        assert_eq!(stats.dropped, 3);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_slow_store_bounds_inflight_inserts() {
        let store = SlowStore {
            inner: MemoryStore::new(),
            delay: Duration::from_millis(100),
        };
        let queue = ActivityQueue::spawn(Arc::new(store.clone()), 2);

        // Let the worker run between submissions so it can pull jobs off the channel
        let mut accepted: u64 = 0;
        for i in 0..50 {
            if queue.enqueue(TABLE.into(), entry(&format!("/{i}"))) {
                accepted += 1;
            }
            tokio::task::yield_now().await;
        }

        let stats = queue.stats();
        assert!(accepted <= 4, "accepted {accepted} entries with capacity 2");
        assert_eq!(stats.submitted, accepted);
        assert_eq!(stats.dropped, 50 - accepted);

        queue.flush().await;
        assert_eq!(queue.stats().persisted, accepted);
        assert_eq!(store.inner.len() as u64, accepted);
    }

    #[test]
    #[should_panic]
    fn test_spawn_requires_a_runtime() {
        let _ = ActivityQueue::spawn(Arc::new(MemoryStore::new()), 4);
    }

    #[tokio::test]
    async fn test_store_errors_are_counted() {
        let store: Arc<dyn AppendOnlyStore> = Arc::new(OfflineStore);
        let queue = ActivityQueue::spawn(store, 4);
        queue.enqueue(TABLE.into(), entry("/offline"));
        queue.flush().await;

        let stats = queue.stats();
        assert_eq!(stats.submitted, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_clones_share_worker_and_counters() {
        let store = MemoryStore::new();
        let queue = ActivityQueue::spawn(Arc::new(store.clone()), 8);
        let other = queue.clone();
        queue.enqueue(TABLE.into(), entry("/one"));
        other.enqueue(TABLE.into(), entry("/two"));

        other.flush().await;
        assert_eq!(queue.stats().persisted, 2);
        assert_eq!(store.len(), 2);
    }
}
