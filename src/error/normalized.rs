//! The normalized error record and the tagged representation of raised values

use std::{collections::HashMap, fmt::Display, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, ErrorKind};

/// Longest message, in characters, that reaches the notification surface
pub const MAX_MESSAGE_CHARS: usize = 240;

/// Diagnostic payload attached to a normalized error
pub type ErrorContextMap = HashMap<String, serde_json::Value>;

/// Any value the UI layer may raise, lifted into a closed set of shapes
#[derive(Debug, Clone)]
pub enum RawError {
    /// Nothing was raised, or the raised value was empty
    Null,
    /// A plain string
    Message(String),
    /// A native error object
    Native {
        name: String,
        message: String,
        stack: Option<String>,
    },
    /// A failed HTTP response
    Http { status: u16, message: Option<String> },
    /// An error body returned by the hosted backend
    Backend {
        code: Option<String>,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },
    /// Any other structured value
    Object(serde_json::Value),
    /// A value that has already been through normalization
    Normalized(NormalizedError),
}

impl RawError {
    /// Lift a Rust error into a native error, rendering its source chain as
    /// the stack.
    pub fn from_error<E>(name: impl Into<String>, err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            chain.push(format!("caused by: {inner}"));
            source = inner.source();
        }
        Self::Native {
            name: name.into(),
            message: err.to_string(),
            stack: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }

    /// Name of the raised value, as a native error would report it
    pub fn name(&self) -> &str {
        match self {
            Self::Native { name, .. } => name,
            Self::Http { .. } => "HttpError",
            Self::Backend { .. } => "BackendError",
            Self::Normalized(err) => err.cause_name(),
            Self::Null | Self::Message(_) | Self::Object(_) => "Error",
        }
    }

    /// The raw message text, before sanitizing
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Message(message) => Some(message),
            Self::Native { message, .. } | Self::Backend { message, .. } => Some(message),
            Self::Http { message, .. } => message.as_deref(),
            Self::Object(value) => ["message", "error_description", "error", "msg"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str())),
            Self::Normalized(err) => Some(err.message()),
        }
    }

    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::Native { stack, .. } => stack.as_deref(),
            Self::Normalized(err) => err.cause().and_then(|cause| cause.stack()),
            _ => None,
        }
    }
}

impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        Self::from(message.to_string())
    }
}

impl From<String> for RawError {
    fn from(message: String) -> Self {
        if message.trim().is_empty() {
            Self::Null
        } else {
            Self::Message(message)
        }
    }
}

impl From<NormalizedError> for RawError {
    fn from(err: NormalizedError) -> Self {
        Self::Normalized(err)
    }
}

fn str_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

impl From<serde_json::Value> for RawError {
    /// Lift a deserialized thrown value into the most specific shape its
    /// fields support.
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::String(message) => Self::from(message),
            Value::Object(ref map) if map.is_empty() => Self::Null,
            Value::Object(_) => {
                let message = str_field(&value, "message");
                if let (Some(name), Some(message)) = (str_field(&value, "name"), message.clone()) {
                    return Self::Native {
                        name,
                        message,
                        stack: str_field(&value, "stack"),
                    };
                }
                if let Some(status) = value.get("status").and_then(|v| v.as_u64()) {
                    if let Ok(status) = u16::try_from(status) {
                        return Self::Http {
                            status,
                            message: message.or_else(|| str_field(&value, "statusText")),
                        };
                    }
                }
                if let (Some(code), Some(message)) = (str_field(&value, "code"), message) {
                    return Self::Backend {
                        code: Some(code),
                        message,
                        details: str_field(&value, "details"),
                        hint: str_field(&value, "hint"),
                    };
                }
                Self::Object(value)
            }
            other => Self::Object(other),
        }
    }
}

impl From<AppError> for RawError {
    fn from(err: AppError) -> Self {
        Self::from(&err)
    }
}

impl From<&AppError> for RawError {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::StoreRejected { status, body } => Self::Http {
                status: *status,
                message: (!body.trim().is_empty()).then(|| body.clone()),
            },
            AppError::HttpError(e) => match e.status() {
                Some(status) => Self::Http {
                    status: status.as_u16(),
                    message: None,
                },
                None if e.is_timeout() => Self::from_error("TimeoutError", e),
                None => Self::from_error("NetworkError", e),
            },
            AppError::SqlxError(sqlx::Error::Database(db)) => Self::Backend {
                code: db.code().map(|c| c.into_owned()),
                message: db.message().to_string(),
                details: None,
                hint: None,
            },
            AppError::InvalidIdentifier(_) | AppError::InvalidRecord(_) => Self::from_error("ValidationError", err),
            other => Self::from_error("AppError", other),
        }
    }
}

impl From<reqwest::Error> for RawError {
    fn from(err: reqwest::Error) -> Self {
        Self::from(AppError::from(err))
    }
}

/// Reduce raw text to something safe to put in front of a user: the first
/// non-blank line, without control characters, capped at
/// [`MAX_MESSAGE_CHARS`]. Returns `None` when nothing is left.
pub fn sanitize_message(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let cleaned: String = line.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    if cleaned.chars().count() <= MAX_MESSAGE_CHARS {
        return Some(cleaned.to_string());
    }
    let mut truncated: String = cleaned.chars().take(MAX_MESSAGE_CHARS - 3).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str("...");
    Some(truncated)
}

/// The pipeline's canonical error record.
///
/// `message` is never empty and is always safe to show. `cause` keeps the
/// original raised value for traces and the log store only; it is skipped on
/// serialization.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedError {
    pub error_id: Uuid,
    pub kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContextMap>,
    #[serde(skip)]
    cause: Option<Arc<RawError>>,
}

impl NormalizedError {
    /// Build a record of the given kind. Falls back to the kind's default
    /// message when `message` sanitizes to nothing.
    pub fn new(kind: ErrorKind, message: impl AsRef<str>) -> Self {
        Self {
            error_id: Uuid::new_v4(),
            kind,
            message: sanitize_message(message.as_ref()).unwrap_or_else(|| kind.default_message().to_string()),
            code: None,
            context: None,
            cause: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the message, keeping the non-empty invariant
    pub fn set_message(&mut self, message: impl AsRef<str>) {
        if let Some(message) = sanitize_message(message.as_ref()) {
            self.message = message;
        }
    }

    pub fn cause(&self) -> Option<&RawError> {
        self.cause.as_deref()
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add one key to the diagnostic context
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.get_or_insert_with(HashMap::new).insert(key.into(), value.into());
        self
    }

    pub fn with_context_map(mut self, context: ErrorContextMap) -> Self {
        match &mut self.context {
            Some(existing) => existing.extend(context),
            None => self.context = Some(context),
        }
        self
    }

    pub fn with_cause(mut self, cause: impl Into<RawError>) -> Self {
        self.cause = Some(Arc::new(cause.into()));
        self
    }

    /// Name of the underlying raised value, for log details
    pub fn cause_name(&self) -> &str {
        self.cause().map(RawError::name).unwrap_or("Error")
    }

    /// Stack trace of the underlying raised value, if any
    pub fn stack(&self) -> Option<&str> {
        self.cause().and_then(RawError::stack)
    }
}

impl Display for NormalizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for NormalizedError {}
