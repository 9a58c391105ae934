//! Error normalization service
//!
//! `ErrorService` is the single place where a raised value becomes a
//! [`NormalizedError`]. Handling an error has exactly two side effects: one
//! notice on the notification surface, and one fire-and-forget `"error"`
//! entry on the activity queue. Neither can fail the caller.

use std::sync::Arc;

use tracing::{error, warn};

use crate::{
    activity::ActivityLogger,
    error::{ErrorSeverity, NormalizedError, RawError, classify, reporter::{Notice, Notifier}},
};

/// Context label used when an error is handled outside any consumer scope
pub const GLOBAL_SCOPE: &str = "global";

#[derive(Clone)]
pub struct ErrorService {
    notifier: Arc<dyn Notifier>,
    activity: ActivityLogger,
}

impl ErrorService {
    pub fn new(notifier: Arc<dyn Notifier>, activity: ActivityLogger) -> Self {
        Self { notifier, activity }
    }

    pub fn activity(&self) -> &ActivityLogger {
        &self.activity
    }

    /// Classify and build the normalized record, with no side effects
    pub fn normalize(&self, raw: impl Into<RawError>) -> NormalizedError {
        classify::normalize(raw)
    }

    /// Normalize `raw`, notify the user once and forward it to the activity
    /// log once. Never fails.
    pub fn handle_error(&self, raw: impl Into<RawError>) -> NormalizedError {
        let err = self.normalize(raw);
        self.handle_normalized(&err, None);
        err
    }

    /// Run the side effects for an error that is already normalized
    pub fn handle_normalized(&self, err: &NormalizedError, scope: Option<&str>) {
        let scope_label = scope.unwrap_or(GLOBAL_SCOPE);
        let code = err.code.as_deref().unwrap_or("none");
        match err.kind.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => error!(
                error_id = %err.error_id,
                kind = %err.kind,
                code,
                scope = scope_label,
                cause = ?err.cause(),
                "{}", err.message()
            ),
            ErrorSeverity::Warning => warn!(
                error_id = %err.error_id,
                kind = %err.kind,
                code,
                scope = scope_label,
                cause = ?err.cause(),
                "{}", err.message()
            ),
        }

        self.notifier.notify(Notice::new(err, scope));

        let email = self.activity.current_identity().and_then(|identity| identity.email);
        self.activity.log_error(err.clone(), scope_label, email.as_deref());
    }
}
