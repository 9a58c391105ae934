//! Wiring of the store, queue, logger, service and notifier

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use crate::{
    activity::{ActivityLogger, ActivityQueue, VisitRecorder},
    config::{PipelineConfig, StoreBackend},
    error::{Result, reporter::{BroadcastNotifier, Notice, Notifier}},
    identity::IdentityProvider,
    navigation::Navigator,
    services::{ErrorHandler, ErrorService},
    storage::{AppendOnlyStore, MemoryStore, PostgrestStore, SqliteStore},
};

/// A fully wired error and activity pipeline
#[derive(Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    store: Arc<dyn AppendOnlyStore>,
    queue: ActivityQueue,
    activity: ActivityLogger,
    service: ErrorService,
    notifier: BroadcastNotifier,
}

impl Pipeline {
    /// Open the configured store and start the activity queue
    pub async fn from_config(config: PipelineConfig, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        let store: Arc<dyn AppendOnlyStore> = match &config.store {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Postgrest { url, anon_key } => Arc::new(PostgrestStore::new(url.clone(), anon_key.clone())?),
            StoreBackend::Sqlite { url } => {
                let store = SqliteStore::connect(url).await?;
                store.ensure_table(&config.activity_table).await?;
                Arc::new(store)
            }
        };
        Ok(Self::with_store(config, identity, store))
    }

    /// Wire the pipeline around an existing store
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, see [`ActivityQueue::spawn`].
    pub fn with_store(
        config: PipelineConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn AppendOnlyStore>,
    ) -> Self {
        info!(
            store = store.name(),
            table = %config.activity_table,
            queue_capacity = config.queue_capacity,
            "Starting error and activity pipeline"
        );
        let queue = ActivityQueue::spawn(store.clone(), config.queue_capacity);
        let activity = ActivityLogger::new(
            queue.clone(),
            identity,
            config.activity_table.as_str(),
            config.anonymous_label.as_str(),
        );
        let notifier = BroadcastNotifier::new(config.notice_capacity);
        let service = ErrorService::new(Arc::new(notifier.clone()) as Arc<dyn Notifier>, activity.clone());
        Self {
            config,
            store,
            queue,
            activity,
            service,
            notifier,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AppendOnlyStore> {
        &self.store
    }

    pub fn queue(&self) -> &ActivityQueue {
        &self.queue
    }

    pub fn activity(&self) -> &ActivityLogger {
        &self.activity
    }

    pub fn service(&self) -> &ErrorService {
        &self.service
    }

    /// Error handling bound to `scope`, e.g. a page name
    pub fn handler(&self, scope: impl Into<Arc<str>>) -> ErrorHandler {
        ErrorHandler::new(self.service.clone(), scope)
    }

    /// Receive every notice raised after this call
    pub fn subscribe_notices(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    /// Record visits for `navigator` until the returned recorder is dropped
    pub fn record_visits(&self, navigator: &Navigator) -> VisitRecorder {
        VisitRecorder::attach(navigator, self.activity.clone())
    }
}
