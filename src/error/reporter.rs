//! Notification surface for normalized errors
//!
//! The UI never sees a [`NormalizedError`] directly. It receives a [`Notice`]
//! wrapping a [`UiError`] projection, which drops the cause and any
//! diagnostic context.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{ErrorKind, ErrorSeverity, NormalizedError};

/// UI-friendly error object for frontend display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiError {
    /// Shared with the developer trace for the same error
    pub id: String,
    pub kind: ErrorKind,
    /// User-friendly error message
    pub message: String,
    /// Suggested actions for the user to recover
    pub actions: Vec<String>,
    /// Whether this is a critical error that requires immediate attention
    pub is_critical: bool,
    /// Whether the user can continue despite this error
    pub can_continue: bool,
    /// Whether repeating the action may succeed
    pub retriable: bool,
    /// Error code for reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Timestamp when the error was observed
    pub timestamp: String,
}

impl From<&NormalizedError> for UiError {
    fn from(err: &NormalizedError) -> Self {
        let severity = err.kind.severity();
        Self {
            id: err.error_id.to_string(),
            kind: err.kind,
            message: err.message().to_string(),
            actions: err.kind.suggested_actions().iter().map(|a| a.to_string()).collect(),
            is_critical: severity == ErrorSeverity::Critical,
            can_continue: !matches!(err.kind, ErrorKind::Authentication),
            retriable: err.kind.is_retriable(),
            error_code: err.code.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A transient message for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Consumer context that observed the error, e.g. a page name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub error: UiError,
}

impl Notice {
    pub fn new(err: &NormalizedError, scope: Option<&str>) -> Self {
        Self {
            scope: scope.map(str::to_string),
            error: UiError::from(err),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.error.kind.severity()
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Display a transient message to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Fans notices out to every subscribed UI surface
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notice>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notice: Notice) {
        // No subscribers means no UI is mounted, the notice has nowhere to go
        if self.sender.send(notice).is_err() {
            tracing::debug!("Notice dropped, no UI subscribers");
        }
    }
}

/// Writes notices to the trace output, for headless use
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let scope = notice.scope.as_deref().unwrap_or("global");
        match notice.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::warn!(
                error_id = %notice.error.id,
                kind = %notice.error.kind,
                scope,
                "{}", notice.error.message
            ),
            ErrorSeverity::Warning => tracing::info!(
                error_id = %notice.error.id,
                kind = %notice.error.kind,
                scope,
                "{}", notice.error.message
            ),
        }
    }
}
