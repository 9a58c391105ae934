//! Classification of raised values into the closed [`ErrorKind`] set
//!
//! Classification runs an ordered list of typed matchers over the tagged
//! [`RawError`] shape. The first matcher that recognizes the value wins; a
//! value nothing recognizes is `Unknown`.

use tracing::trace;

use crate::error::{ErrorKind, NormalizedError, RawError, normalized::sanitize_message};

/// A single classification rule
pub type Matcher = fn(&RawError) -> Option<ErrorKind>;

/// Matchers in priority order, each named for tracing
pub const MATCHERS: &[(&str, Matcher)] = &[
    ("normalized", match_normalized),
    ("http_status", match_http_status),
    ("backend_code", match_backend_code),
    ("native_name", match_native_name),
    ("message", match_message),
];

fn match_normalized(raw: &RawError) -> Option<ErrorKind> {
    match raw {
        RawError::Normalized(err) => Some(err.kind),
        _ => None,
    }
}

fn match_http_status(raw: &RawError) -> Option<ErrorKind> {
    match raw {
        RawError::Http { status, .. } => match ErrorKind::from_status(*status) {
            ErrorKind::Unknown => None,
            kind => Some(kind),
        },
        _ => None,
    }
}

/// Kind for a hosted-backend error code (PostgREST codes and SQLSTATE classes)
pub fn kind_for_backend_code(code: &str) -> Option<ErrorKind> {
    match code {
        "PGRST116" => Some(ErrorKind::NotFound),
        "42501" => Some(ErrorKind::Authorization),
        "PGRST301" | "PGRST302" => Some(ErrorKind::Authentication),
        code if code.starts_with("PGRST") => Some(ErrorKind::ServerSide),
        code if code.len() == 5 => match code.get(..2) {
            Some("22" | "23") => Some(ErrorKind::Validation),
            Some("28") => Some(ErrorKind::Authentication),
            Some("08") => Some(ErrorKind::Network),
            Some("42" | "53" | "54" | "57" | "58" | "XX") => Some(ErrorKind::ServerSide),
            _ => None,
        },
        _ => None,
    }
}

fn match_backend_code(raw: &RawError) -> Option<ErrorKind> {
    match raw {
        RawError::Backend { code: Some(code), .. } => kind_for_backend_code(code),
        _ => None,
    }
}

fn match_native_name(raw: &RawError) -> Option<ErrorKind> {
    let RawError::Native { name, message, .. } = raw else {
        return None;
    };
    match name.as_str() {
        "TypeError" if message.to_lowercase().contains("fetch") => Some(ErrorKind::Network),
        "NetworkError" | "AbortError" | "TimeoutError" => Some(ErrorKind::Network),
        "ValidationError" | "ZodError" | "RangeError" => Some(ErrorKind::Validation),
        "AuthApiError" | "AuthSessionMissingError" | "AuthenticationError" => Some(ErrorKind::Authentication),
        "AuthorizationError" | "ForbiddenError" => Some(ErrorKind::Authorization),
        "NotFoundError" => Some(ErrorKind::NotFound),
        _ => None,
    }
}

const MESSAGE_HINTS: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::Network,
        &["network", "failed to fetch", "fetch", "timeout", "timed out", "connection"],
    ),
    (
        ErrorKind::Authentication,
        &[
            "not authenticated",
            "jwt",
            "session expired",
            "expired",
            "token",
            "unauthorized",
            "invalid login",
            "not logged in",
        ],
    ),
    (ErrorKind::Authorization, &["forbidden", "permission", "not allowed"]),
    (ErrorKind::NotFound, &["not found"]),
    (ErrorKind::Validation, &["invalid", "required", "must be"]),
];

fn match_message(raw: &RawError) -> Option<ErrorKind> {
    let message = raw.message()?.to_lowercase();
    MESSAGE_HINTS
        .iter()
        .find(|(_, hints)| hints.iter().any(|hint| message.contains(hint)))
        .map(|(kind, _)| *kind)
}

/// Classify a raised value. Never fails; unrecognized values are `Unknown`.
pub fn classify(raw: &RawError) -> ErrorKind {
    match MATCHERS.iter().find_map(|(name, matcher)| matcher(raw).map(|kind| (*name, kind))) {
        Some((matcher, kind)) => {
            trace!(matcher, kind = %kind, "Classified error");
            kind
        }
        None => {
            trace!(name = raw.name(), "No matcher recognized error");
            ErrorKind::Unknown
        }
    }
}

/// Build the normalized record for a raised value, with no side effects.
/// An already-normalized value is returned as it is.
pub fn normalize(raw: impl Into<RawError>) -> NormalizedError {
    let raw = raw.into();
    if let RawError::Normalized(err) = raw {
        return err;
    }

    let kind = classify(&raw);
    let mut message = raw.message().and_then(sanitize_message);
    let mut err = NormalizedError::new(kind, "");

    match &raw {
        RawError::Http { status, .. } => {
            err = err.with_code(format!("http_{status}")).with_context("status", *status);
        }
        RawError::Backend {
            code, details, hint, ..
        } => {
            if let Some(code) = code {
                err = err.with_code(code.clone());
            }
            if let Some(details) = details {
                err = err.with_context("details", details.clone());
            }
            if let Some(hint) = hint {
                err = err.with_context("hint", hint.clone());
            }
            // Database internals are not shown to users
            if kind == ErrorKind::ServerSide {
                message = None;
            }
        }
        RawError::Object(value) => {
            if let Some(code) = value.get("code").and_then(|v| v.as_str()) {
                err = err.with_code(code);
            }
        }
        RawError::Native { name, .. } => {
            err = err.with_context("name", name.clone());
        }
        RawError::Null | RawError::Message(_) | RawError::Normalized(_) => {}
    }

    if let Some(message) = message {
        err.set_message(message);
    }
    err.with_cause(raw)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_http_statuses() {
        let cases = [
            (400, ErrorKind::Validation),
            (401, ErrorKind::Authentication),
            (403, ErrorKind::Authorization),
            (404, ErrorKind::NotFound),
            (408, ErrorKind::Network),
            (502, ErrorKind::ServerSide),
        ];
        for (status, kind) in cases {
            let raw = RawError::Http { status, message: None };
            assert_eq!(classify(&raw), kind, "status {status}");
        }
    }

    #[test]
    fn test_unmapped_status_falls_through_to_message() {
        let raw = RawError::Http {
            status: 418,
            message: Some("Request timed out".into()),
        };
        assert_eq!(classify(&raw), ErrorKind::Network);
    }

    #[test]
    fn test_backend_codes() {
        assert_eq!(kind_for_backend_code("PGRST116"), Some(ErrorKind::NotFound));
        assert_eq!(kind_for_backend_code("42501"), Some(ErrorKind::Authorization));
        assert_eq!(kind_for_backend_code("PGRST301"), Some(ErrorKind::Authentication));
        assert_eq!(kind_for_backend_code("23505"), Some(ErrorKind::Validation));
        assert_eq!(kind_for_backend_code("22P02"), Some(ErrorKind::Validation));
        assert_eq!(kind_for_backend_code("PGRST204"), Some(ErrorKind::ServerSide));
        assert_eq!(kind_for_backend_code("nope"), None);
    }

    #[test]
    fn test_native_names() {
        let fetch = RawError::Native {
            name: "TypeError".into(),
            message: "Failed to fetch".into(),
            stack: None,
        };
        assert_eq!(classify(&fetch), ErrorKind::Network);

        let type_error = RawError::Native {
            name: "TypeError".into(),
            message: "x is undefined".into(),
            stack: None,
        };
        assert_eq!(classify(&type_error), ErrorKind::Unknown);

        let auth = RawError::Native {
            name: "AuthApiError".into(),
            message: "Email rate limit exceeded".into(),
            stack: None,
        };
        assert_eq!(classify(&auth), ErrorKind::Authentication);
    }

    #[test]
    fn test_message_heuristics_in_order() {
        assert_eq!(classify(&"Invalid login credentials".into()), ErrorKind::Authentication);
        assert_eq!(classify(&"permission denied for table".into()), ErrorKind::Authorization);
        assert_eq!(classify(&"Course not found".into()), ErrorKind::NotFound);
        assert_eq!(classify(&"Email is required".into()), ErrorKind::Validation);
        assert_eq!(classify(&"connection reset".into()), ErrorKind::Network);
        assert_eq!(classify(&"Token has expired or is invalid".into()), ErrorKind::Authentication);
        assert_eq!(classify(&"Refresh token not found".into()), ErrorKind::Authentication);
        assert_eq!(classify(&"Link expired".into()), ErrorKind::Authentication);
        assert_eq!(classify(&"boom".into()), ErrorKind::Unknown);
    }

    #[test]
    fn test_normalize_null_and_objects() {
        let err = normalize(RawError::Null);
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message(), ErrorKind::Unknown.default_message());

        let err = normalize(json!({"foo": 1}));
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(!err.message().is_empty());

        let err = normalize(json!({"error": "Token has expired or is invalid", "code": "bad_jwt"}));
        assert_eq!(err.code.as_deref(), Some("bad_jwt"));
        assert_eq!(err.message(), "Token has expired or is invalid");
    }

    #[test]
    fn test_normalize_backend_server_error_hides_message() {
        let err = normalize(json!({
            "code": "42P01",
            "message": "relation \"public.secret\" does not exist",
            "details": null,
            "hint": "check the schema"
        }));
        assert_eq!(err.kind, ErrorKind::ServerSide);
        assert_eq!(err.message(), ErrorKind::ServerSide.default_message());
        assert_eq!(err.code.as_deref(), Some("42P01"));
        assert_eq!(err.context.as_ref().unwrap()["hint"], "check the schema");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let first = normalize("Card number is invalid");
        let id = first.error_id;
        let second = normalize(first);
        assert_eq!(second.error_id, id);
        assert_eq!(second.kind, ErrorKind::Validation);
    }
}
