use std::io;

use thiserror::Error;

// Error modules
pub mod classify;
pub mod normalized;
pub mod reporter;
pub mod taxonomy;

pub use normalized::{ErrorContextMap, NormalizedError, RawError};
pub use taxonomy::{ErrorKind, ErrorSeverity};

macro_rules! from_err {
    ($err:ty, $enum:expr) => {
        impl From<$err> for AppError {
            fn from(e: $err) -> Self {
                $enum(e)
            }
        }
    };
}

/// Infrastructure error for the pipeline's own collaborators (stores, HTTP,
/// configuration). UI-facing failures are modelled by [`NormalizedError`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("SQLx error: {0}")]
    SqlxError(#[source] sqlx::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[source] reqwest::Error),
    #[error("Invalid JSON payload: {0}")]
    JsonError(#[source] serde_json::Error),
    #[error("Invalid URL: {0}")]
    UrlParseError(#[source] url::ParseError),
    #[error("IO error: {0}")]
    IoError(#[source] io::Error),

    #[error("Store rejected insert with status {status}: {body}")]
    StoreRejected { status: u16, body: String },
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

from_err!(sqlx::Error, AppError::SqlxError);
from_err!(reqwest::Error, AppError::HttpError);
from_err!(serde_json::Error, AppError::JsonError);
from_err!(url::ParseError, AppError::UrlParseError);
from_err!(io::Error, AppError::IoError);

impl AppError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Create a new external service error
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::ExternalServiceError(message.into())
    }

    /// Map this error onto the closed UI taxonomy
    pub fn category(&self) -> ErrorKind {
        match self {
            Self::SqlxError(e) => match e {
                sqlx::Error::RowNotFound => ErrorKind::NotFound,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => ErrorKind::Network,
                sqlx::Error::Database(db) if db.is_unique_violation() || db.is_check_violation() => {
                    ErrorKind::Validation
                }
                _ => ErrorKind::ServerSide,
            },
            Self::HttpError(e) => match e.status() {
                Some(status) => ErrorKind::from_status(status.as_u16()),
                None if e.is_decode() || e.is_builder() => ErrorKind::Unknown,
                None => ErrorKind::Network,
            },
            Self::StoreRejected { status, .. } => ErrorKind::from_status(*status),
            Self::InvalidIdentifier(_) | Self::InvalidRecord(_) => ErrorKind::Validation,
            Self::IoError(_) => ErrorKind::Network,
            Self::JsonError(_)
            | Self::UrlParseError(_)
            | Self::ConfigurationError(_)
            | Self::ExternalServiceError(_) => ErrorKind::ServerSide,
        }
    }

    /// Check if this error is retriable
    pub fn is_retriable(&self) -> bool {
        self.category().is_retriable()
    }

    /// Machine-readable code carried into a normalized error
    pub fn code(&self) -> Option<String> {
        match self {
            Self::StoreRejected { status, .. } => Some(format!("http_{status}")),
            Self::HttpError(e) => e.status().map(|s| format!("http_{}", s.as_u16())),
            Self::SqlxError(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
            _ => None,
        }
    }
}

pub type Result<T, E = AppError> = core::result::Result<T, E>;
