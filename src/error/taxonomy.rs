//! Error taxonomy for the pipeline
//!
//! Every failure observed by the UI layer is folded into one of a small, closed
//! set of kinds. Each kind carries a default user-safe message, a severity and
//! a retriability flag, so that presentation and logging never need to inspect
//! the raw value again.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Warnings that don't prevent the user from continuing
    Warning,
    /// Errors that interrupt the current action
    #[default]
    Error,
    /// Errors that block the session until the user acts
    Critical,
}

impl Display for ErrorSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Closed classification of the origin of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input was rejected by a validation rule or constraint
    Validation,
    /// The request never reached the server or timed out
    Network,
    /// The caller is not signed in, or the session expired
    Authentication,
    /// The caller is signed in but not allowed to do this
    Authorization,
    /// The requested resource does not exist
    NotFound,
    /// The server failed while handling the request
    ServerSide,
    /// Nothing recognizable could be extracted from the raised value
    #[default]
    Unknown,
}

impl ErrorKind {
    /// All kinds, in declaration order
    pub const ALL: [ErrorKind; 7] = [
        Self::Validation,
        Self::Network,
        Self::Authentication,
        Self::Authorization,
        Self::NotFound,
        Self::ServerSide,
        Self::Unknown,
    ];

    /// Kind for an HTTP status code. Status `0` is what a browser reports when
    /// the request never got a response.
    pub fn from_status(status: u16) -> Self {
        match status {
            0 | 408 | 429 => Self::Network,
            400 | 409 | 422 => Self::Validation,
            401 => Self::Authentication,
            403 => Self::Authorization,
            404 | 410 => Self::NotFound,
            500..=599 => Self::ServerSide,
            _ => Self::Unknown,
        }
    }

    /// Stable snake_case name used in serialized output and log details
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::ServerSide => "server_side",
            Self::Unknown => "unknown",
        }
    }

    /// Message shown when the raised value carries nothing usable
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Validation => "Some of the information provided is invalid. Please check it and try again.",
            Self::Network => "We couldn't reach the server. Check your connection and try again.",
            Self::Authentication => "Your session has expired. Please sign in again.",
            Self::Authorization => "You don't have permission to perform this action.",
            Self::NotFound => "The item you're looking for could not be found.",
            Self::ServerSide => "Something went wrong on our side. Please try again in a moment.",
            Self::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation | Self::NotFound => ErrorSeverity::Warning,
            Self::Authentication => ErrorSeverity::Critical,
            Self::Network | Self::Authorization | Self::ServerSide | Self::Unknown => ErrorSeverity::Error,
        }
    }

    /// Whether repeating the same action may succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Network | Self::ServerSide => true,
            Self::Validation | Self::Authentication | Self::Authorization | Self::NotFound | Self::Unknown => false,
        }
    }

    /// Suggested recovery actions for the notification surface
    pub fn suggested_actions(&self) -> &'static [&'static str] {
        match self {
            Self::Validation => &[
                "Review the highlighted fields and correct any errors",
                "Make sure all required fields are filled out",
            ],
            Self::Network => &["Check your internet connection", "Try again in a few moments"],
            Self::Authentication => &["Please sign in to continue"],
            Self::Authorization => &[
                "Check that you're using the correct account",
                "Contact support to request access",
            ],
            Self::NotFound => &["Return to the previous page and try again"],
            Self::ServerSide => &["Please try again in a few moments"],
            Self::Unknown => &["Try again", "If the problem persists, contact support"],
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
