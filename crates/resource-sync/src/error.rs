//! # Errors & Normalization
//!
//! Two layers of errors live here:
//!
//! - [`TransportError`] is what a backend hands back when a call fails: a network
//!   failure with no response, an HTTP error with whatever body the server chose to
//!   send, or a success response we could not decode.
//! - [`NormalizedError`] is the single user-facing shape the store keeps as
//!   `last_error`. [`normalize`] converts the former into the latter and is total:
//!   every input, however malformed, produces a populated `{status, message, field_errors}`.
//!
//! [`FrameworkError`] covers failures of the engine's own tasks.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Errors that can occur within the synchronization engine itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),
}

/// Body of a failed HTTP response, exactly as it came off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

/// A failed backend call, before normalization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// No response was received (connection refused, DNS, offline).
    #[error("Network failure: {0}")]
    Network(String),

    /// The transport gave up waiting. Reported like a network failure.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    Http { status: u16, body: ResponseBody },

    /// The server answered with success but the payload could not be understood.
    #[error("Malformed response (HTTP {status}): {reason}")]
    Decode { status: u16, reason: String },

    /// A client-side step failed after the call (e.g. saving a downloaded file).
    #[error("{0}")]
    Local(String),
}

/// Error category, derived from the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 400 / 422, usually carrying field errors shown inline.
    Validation,
    /// 401 / 403, handled by the session collaborator, never retried here.
    Auth,
    /// 404, shown as an empty or removed state.
    NotFound,
    /// 409 / 423.
    ConflictOrLocked,
    /// 429.
    RateLimited,
    /// 5xx.
    Server,
    /// No response at all.
    Network,
    Unknown,
}

impl ErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => ErrorKind::Network,
            400 | 422 => ErrorKind::Validation,
            401 | 403 => ErrorKind::Auth,
            404 => ErrorKind::NotFound,
            409 | 423 => ErrorKind::ConflictOrLocked,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        }
    }
}

/// Message used when the body offers nothing better.
pub fn default_message(status: u16) -> &'static str {
    match status {
        0 => "Unable to reach server",
        400 | 422 => "The request was rejected as invalid",
        401 => "Invalid credentials or insufficient privileges",
        403 => "Access denied",
        404 => "Not found",
        409 => "The resource was changed by someone else",
        423 => "Account locked, retry later",
        429 => "Rate limit exceeded",
        500..=599 => "Server error, try again later",
        _ => "Something went wrong",
    }
}

/// The user-facing error shape kept in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct NormalizedError {
    /// HTTP status, `0` when no response was received.
    pub status: u16,
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
    pub kind: ErrorKind,
}

impl NormalizedError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            field_errors: BTreeMap::new(),
            kind: ErrorKind::from_status(status),
        }
    }

    /// An error that happened on this side of the wire.
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            ..Self::new(0, message)
        }
    }
}

impl From<&TransportError> for NormalizedError {
    fn from(error: &TransportError) -> Self {
        normalize(error)
    }
}

/// Converts any transport failure into a [`NormalizedError`]. Never panics.
///
/// Message resolution order: explicit `fieldErrors`/`errors` > `message` > `error` >
/// a default derived from the status.
pub fn normalize(error: &TransportError) -> NormalizedError {
    match error {
        TransportError::Network(_) | TransportError::Timeout => {
            NormalizedError::new(0, default_message(0))
        }
        TransportError::Http { status, body } => from_body(*status, body),
        TransportError::Decode { status, .. } => NormalizedError {
            kind: ErrorKind::Unknown,
            ..NormalizedError::new(*status, "Unexpected response from server")
        },
        TransportError::Local(message) => NormalizedError::local(message.as_str()),
    }
}

fn from_body(status: u16, body: &ResponseBody) -> NormalizedError {
    let mut normalized = NormalizedError::new(status, default_message(status));

    let parsed = match body {
        ResponseBody::Empty => return normalized,
        ResponseBody::Json(value) => value.clone(),
        ResponseBody::Text(text) => {
            if text.trim().is_empty() {
                return normalized;
            }
            // One parse attempt; anything unparseable is shown verbatim.
            match serde_json::from_str::<Value>(text) {
                Ok(value) => value,
                Err(_) => {
                    normalized.message = text.clone();
                    return normalized;
                }
            }
        }
    };

    match parsed {
        Value::Object(object) => {
            normalized.field_errors = field_errors(&object);
            if let Some(message) = resolve_message(&object, &normalized.field_errors) {
                normalized.message = message;
            }
        }
        Value::String(text) if !text.trim().is_empty() => normalized.message = text,
        _ => {}
    }
    normalized
}

fn resolve_message(object: &Map<String, Value>, fields: &BTreeMap<String, String>) -> Option<String> {
    if !fields.is_empty() {
        let summary = fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        return Some(summary);
    }

    // `errors` sometimes arrives as a bare string or a list of strings.
    let loose = object
        .get("fieldErrors")
        .or_else(|| object.get("errors"))
        .and_then(loose_messages);

    loose
        .or_else(|| non_empty_str(object.get("message")))
        .or_else(|| match object.get("error") {
            Some(Value::Object(inner)) => non_empty_str(inner.get("message")),
            other => non_empty_str(other),
        })
}

fn field_errors(object: &Map<String, Value>) -> BTreeMap<String, String> {
    let source = match object.get("fieldErrors").or_else(|| object.get("errors")) {
        Some(source) => source,
        None => return BTreeMap::new(),
    };

    match source {
        Value::Object(fields) => fields
            .iter()
            .filter_map(|(field, value)| describe(value).map(|message| (field.clone(), message)))
            .collect(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| {
                let entry = entry.as_object()?;
                let field = ["field", "path", "param"]
                    .iter()
                    .find_map(|key| non_empty_str(entry.get(*key)))?;
                let message = ["message", "msg"]
                    .iter()
                    .find_map(|key| non_empty_str(entry.get(*key)))?;
                Some((field, message))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn loose_messages(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(entries) => {
            let messages: Vec<&str> = entries.iter().filter_map(Value::as_str).collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

fn describe(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(entries) => entries.iter().find_map(describe),
        Value::Object(inner) => non_empty_str(inner.get("message")),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn http(status: u16, body: ResponseBody) -> TransportError {
        TransportError::Http { status, body }
    }

    #[test]
    fn test_network_failure_uses_offline_message() {
        let normalized = normalize(&TransportError::Network("connection refused".into()));
        assert_eq!(normalized.status, 0);
        assert_eq!(normalized.message, "Unable to reach server");
        assert_eq!(normalized.kind, ErrorKind::Network);

        let timeout = normalize(&TransportError::Timeout);
        assert_eq!(timeout.message, "Unable to reach server");
    }

    #[test]
    fn test_status_defaults_when_body_is_unhelpful() {
        let cases = [
            (401, "Invalid credentials or insufficient privileges"),
            (403, "Access denied"),
            (404, "Not found"),
            (423, "Account locked, retry later"),
            (429, "Rate limit exceeded"),
            (500, "Server error, try again later"),
            (503, "Server error, try again later"),
        ];
        for (status, expected) in cases {
            let normalized = normalize(&http(status, ResponseBody::Json(json!({}))));
            assert_eq!(normalized.message, expected, "status {status}");
            assert_eq!(normalized.status, status);
        }
    }

    #[test]
    fn test_field_errors_take_precedence() {
        let body = json!({
            "message": "Validation failed",
            "errors": { "email": "already taken", "name": ["is required", "too short"] }
        });
        let normalized = normalize(&http(422, ResponseBody::Json(body)));
        assert_eq!(normalized.kind, ErrorKind::Validation);
        assert_eq!(normalized.field_errors.get("email").map(String::as_str), Some("already taken"));
        assert_eq!(normalized.field_errors.get("name").map(String::as_str), Some("is required"));
        assert_eq!(normalized.message, "email: already taken; name: is required");
    }

    #[test]
    fn test_field_errors_from_list_of_entries() {
        let body = json!({ "fieldErrors": [ { "field": "rate", "message": "must be positive" } ] });
        let normalized = normalize(&http(400, ResponseBody::Json(body)));
        assert_eq!(normalized.field_errors.len(), 1);
        assert_eq!(normalized.message, "rate: must be positive");
    }

    #[test]
    fn test_message_beats_error() {
        let body = json!({ "message": "Tenant is suspended", "error": "Forbidden" });
        let normalized = normalize(&http(403, ResponseBody::Json(body)));
        assert_eq!(normalized.message, "Tenant is suspended");
        assert_eq!(normalized.kind, ErrorKind::Auth);

        let nested = json!({ "error": { "message": "Invoice already paid" } });
        let normalized = normalize(&http(409, ResponseBody::Json(nested)));
        assert_eq!(normalized.message, "Invoice already paid");
        assert_eq!(normalized.kind, ErrorKind::ConflictOrLocked);
    }

    #[test]
    fn test_string_body_is_parsed_once() {
        let text = r#"{"error":"Template not found"}"#.to_string();
        let normalized = normalize(&http(404, ResponseBody::Text(text)));
        assert_eq!(normalized.message, "Template not found");

        let truncated = r#"{"message":"Rule inva"#.to_string();
        let normalized = normalize(&http(500, ResponseBody::Text(truncated.clone())));
        assert_eq!(normalized.message, truncated);
    }

    #[test]
    fn test_normalize_is_total() {
        let inputs = vec![
            http(500, ResponseBody::Json(Value::Null)),
            http(400, ResponseBody::Text("plain failure".into())),
            http(502, ResponseBody::Text("<html>Bad Gateway".into())),
            http(418, ResponseBody::Json(json!({ "unrelated": true }))),
            http(400, ResponseBody::Json(json!({ "errors": 42, "error": [] }))),
            http(500, ResponseBody::Text("   ".into())),
            http(500, ResponseBody::Empty),
            TransportError::Decode { status: 200, reason: "expected array".into() },
            TransportError::Local("disk full".into()),
        ];
        for input in inputs {
            let normalized = normalize(&input);
            assert!(!normalized.message.is_empty(), "{input:?}");
        }
    }

    #[test]
    fn test_unknown_status_gets_generic_message() {
        let normalized = normalize(&http(418, ResponseBody::Json(json!({ "unrelated": true }))));
        assert_eq!(normalized.kind, ErrorKind::Unknown);
        assert_eq!(normalized.message, "Something went wrong");
    }
}
