use std::{future::Future, sync::Arc};

use crate::{
    error::{ErrorContextMap, ErrorKind, NormalizedError, RawError},
    services::error_service::ErrorService,
};

/// Error handling bound to one consumer context, such as a page
#[derive(Clone)]
pub struct ErrorHandler {
    service: ErrorService,
    scope: Arc<str>,
}

impl ErrorHandler {
    pub fn new(service: ErrorService, scope: impl Into<Arc<str>>) -> Self {
        Self {
            service,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Normalize, notify and log `raw` in this handler's scope
    pub fn handle_error(&self, raw: impl Into<RawError>) -> NormalizedError {
        let err = self.service.normalize(raw);
        self.service.handle_normalized(&err, Some(self.scope()));
        err
    }

    /// Build a normalized error without notifying or logging anything.
    /// The caller vouches for `kind`.
    pub fn create_error(
        &self,
        kind: ErrorKind,
        message: impl AsRef<str>,
        code: Option<String>,
        context: Option<ErrorContextMap>,
        cause: Option<RawError>,
    ) -> NormalizedError {
        let mut err = NormalizedError::new(kind, message);
        err.code = code;
        if let Some(context) = context {
            err = err.with_context_map(context);
        }
        if let Some(cause) = cause {
            err = err.with_cause(cause);
        }
        err
    }

    /// Await `operation`. A failure is normalized and handled exactly once,
    /// with its message replaced by `override_message` when given, and then
    /// handed back so the caller can add local recovery. The user has
    /// already been notified at that point.
    pub async fn catch_error<T, E, F>(&self, operation: F, override_message: Option<&str>) -> Result<T, NormalizedError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<RawError>,
    {
        match operation.await {
            Ok(value) => Ok(value),
            Err(e) => {
                let mut err = self.service.normalize(e);
                if let Some(message) = override_message {
                    err.set_message(message);
                }
                self.service.handle_normalized(&err, Some(self.scope()));
                Err(err)
            }
        }
    }
}
