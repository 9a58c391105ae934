//! Best-effort activity log
//!
//! Entries are write-once records appended to a single remote table. The
//! logger never reads, updates or deletes them, and never tells its caller
//! whether a write succeeded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::RawError,
    identity::{Identity, IdentityProvider},
};

pub mod queue;
pub mod visit;

pub use queue::{ActivityQueue, QueueStats};
pub use visit::VisitRecorder;

/// Entry type for page visits
pub const VISIT: &str = "visit";
/// Entry type for errors
pub const ERROR: &str = "error";

/// One row of the activity table. The store assigns the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub details: String,
}

impl ActivityLogEntry {
    pub fn new(entry_type: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            user_id: None,
            user_email: None,
            details: details.into(),
        }
    }

    pub fn with_actor(mut self, identity: &Identity) -> Self {
        self.user_id = Some(identity.id.clone());
        self.user_email = identity.email.clone();
        self
    }
}

/// Render error details as `[<context>] <name>: <message>`, followed by the
/// stack on the next line when there is one
pub fn error_details(error: &RawError, context: &str) -> String {
    let (name, message, stack) = match error {
        // Log the original value rather than the user-facing summary
        RawError::Normalized(err) => match err.cause() {
            Some(cause) => (cause.name(), cause.message().unwrap_or(err.message()), cause.stack()),
            None => (err.cause_name(), err.message(), None),
        },
        other => (other.name(), other.message().unwrap_or("(no message)"), other.stack()),
    };
    let mut details = format!("[{context}] {name}: {message}");
    if let Some(stack) = stack {
        details.push('\n');
        details.push_str(stack);
    }
    details
}

/// Records user and error events for signed-in sessions
#[derive(Clone)]
pub struct ActivityLogger {
    queue: ActivityQueue,
    identity: Arc<dyn IdentityProvider>,
    table: Arc<str>,
    anonymous_label: Arc<str>,
}

impl ActivityLogger {
    pub fn new(
        queue: ActivityQueue,
        identity: Arc<dyn IdentityProvider>,
        table: impl Into<Arc<str>>,
        anonymous_label: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            queue,
            identity,
            table: table.into(),
            anonymous_label: anonymous_label.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn queue(&self) -> &ActivityQueue {
        &self.queue
    }

    /// The signed-in user, if any
    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.current()
    }

    /// Record an event for the signed-in user. Does nothing while signed out.
    pub fn log_activity(&self, entry_type: &str, details: impl Into<String>) {
        let Some(identity) = self.identity.current() else {
            debug!(entry_type, "No signed-in user, activity not recorded");
            return;
        };
        let entry = ActivityLogEntry::new(entry_type, details).with_actor(&identity);
        self.queue.enqueue(self.table.clone(), entry);
    }

    /// Record an error. Unlike [`log_activity`](Self::log_activity) this is
    /// not gated on sign-in; `actor_email` falls back to the anonymous label.
    pub fn log_error(&self, error: impl Into<RawError>, context: &str, actor_email: Option<&str>) {
        let error = error.into();
        let entry = ActivityLogEntry {
            entry_type: ERROR.to_string(),
            user_id: self.identity.current().map(|identity| identity.id),
            user_email: Some(actor_email.unwrap_or(&*self.anonymous_label).to_string()),
            details: error_details(&error, context),
        };
        self.queue.enqueue(self.table.clone(), entry);
    }
}
