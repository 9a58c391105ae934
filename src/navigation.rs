//! Logical page path with change notifications

use std::sync::{
    Arc, Mutex, MutexGuard, Weak,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::{broadcast, watch};

const CHANGE_CAPACITY: usize = 64;

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
}

impl Listeners {
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Navigation observer. Only distinct paths are published, so navigating to
/// the page that is already current is not a new navigation.
#[derive(Clone)]
pub struct Navigator {
    current: Arc<watch::Sender<String>>,
    changes: broadcast::Sender<String>,
    listeners: Arc<Listeners>,
}

impl Navigator {
    pub fn new(initial_path: impl Into<String>) -> Self {
        let (current, _) = watch::channel(initial_path.into());
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            current: Arc::new(current),
            changes,
            listeners: Arc::default(),
        }
    }

    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    /// Move to `path`. Returns `false` when `path` is already current.
    ///
    /// Listeners run on the calling thread before this returns.
    pub fn navigate(&self, path: impl Into<String>) -> bool {
        let path = path.into();
        let changed = self.current.send_if_modified(|current| {
            if *current == path {
                false
            } else {
                current.clone_from(&path);
                true
            }
        });
        if changed {
            // Snapshot so a listener may register or drop listeners itself
            let listeners: Vec<Listener> = self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
            for listener in listeners {
                listener(&path);
            }
            // Nobody listening is fine, the current path is still tracked
            let _ = self.changes.send(path);
        }
        changed
    }

    /// Subscribe to path changes made after this call
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }

    /// Call `listener` with every distinct path, synchronously inside
    /// [`navigate`](Self::navigate). The listener is removed when the
    /// returned guard is dropped.
    pub fn on_navigate(&self, listener: impl Fn(&str) + Send + Sync + 'static) -> NavigationListener {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::new(listener)));
        NavigationListener {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("current", &*self.current.borrow())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

/// Registration returned by [`Navigator::on_navigate`]
#[must_use = "the listener is removed when this is dropped"]
pub struct NavigationListener {
    id: u64,
    listeners: Weak<Listeners>,
}

impl NavigationListener {
    /// False once every handle to the navigator has been dropped
    pub fn is_attached(&self) -> bool {
        self.listeners.strong_count() > 0
    }
}

impl Drop for NavigationListener {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
