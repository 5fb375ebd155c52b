//! Error events and their builder.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InsightsError;
use crate::fingerprint::fingerprint;
use crate::log_buffer::LogLine;
use crate::trace::ErrorDetails;

/// What kind of execution produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    HttpRequest,
    Async,
    Scheduled,
    Transactional,
    EventListener,
    UncaughtThread,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::HttpRequest => "http_request",
            EventKind::Async => "async",
            EventKind::Scheduled => "scheduled",
            EventKind::Transactional => "transactional",
            EventKind::EventListener => "event_listener",
            EventKind::UncaughtThread => "uncaught_thread",
        }
    }
}

/// Request details attached to `HttpRequest` events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpContext {
    pub method: String,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Outcome of a completed explanation, attached to an event at most once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub summary: String,
    pub causes: Vec<String>,
    pub fixes: Vec<String>,
    pub raw_response: Option<String>,
}

/// A captured error occurrence. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub error: ErrorDetails,
    /// Call-site fingerprint used for deduplication. The builder always
    /// produces one; an empty string opts the event out of dedup.
    pub fingerprint: String,
    /// Present only for `HttpRequest` events.
    pub http: Option<HttpContext>,
    /// Free-form caller context, copied at construction time.
    pub context: HashMap<String, String>,
    /// Log lines snapshotted when the event was built. Frozen copy; later
    /// ring-buffer writes never affect it.
    pub recent_logs: Vec<LogLine>,
}

impl ErrorEvent {
    pub fn builder() -> ErrorEventBuilder {
        ErrorEventBuilder::default()
    }
}

/// Builds an [`ErrorEvent`], rejecting incomplete input.
///
/// A kind and error details are both required; everything else is
/// optional. The fingerprint is computed from the outermost error's type
/// and top frames at build time.
#[derive(Default)]
pub struct ErrorEventBuilder {
    kind: Option<EventKind>,
    timestamp: Option<DateTime<Utc>>,
    error: Option<ErrorDetails>,
    http: Option<HttpContext>,
    context: HashMap<String, String>,
    recent_logs: Vec<LogLine>,
}

impl ErrorEventBuilder {
    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Overrides the event timestamp; defaults to now at build time.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Captures type, message, cause chain and call-site frames from `err`.
    pub fn error<E>(mut self, err: &E) -> Self
    where
        E: std::error::Error,
    {
        self.error = Some(ErrorDetails::capture(err));
        self
    }

    /// Uses pre-captured details, for paths with no live error value.
    pub fn details(mut self, details: ErrorDetails) -> Self {
        self.error = Some(details);
        self
    }

    pub fn http(mut self, http: HttpContext) -> Self {
        self.http = Some(http);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn recent_logs(mut self, logs: Vec<LogLine>) -> Self {
        self.recent_logs = logs;
        self
    }

    pub fn build(self) -> Result<ErrorEvent, InsightsError> {
        let kind = self.kind.ok_or(InsightsError::MissingKind)?;
        let error = self.error.ok_or(InsightsError::MissingError)?;
        let fp = fingerprint(&error);

        Ok(ErrorEvent {
            id: Uuid::new_v4().to_string(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            kind,
            error,
            fingerprint: fp,
            http: self.http,
            context: self.context,
            recent_logs: self.recent_logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_buffer::LogSeverity;

    #[test]
    fn build_without_error_is_rejected() {
        let result = ErrorEvent::builder().kind(EventKind::HttpRequest).build();
        assert_eq!(result.unwrap_err(), InsightsError::MissingError);
    }

    #[test]
    fn build_without_kind_is_rejected() {
        let result = ErrorEvent::builder()
            .details(ErrorDetails::from_parts("app::DbError", "boom"))
            .build();
        assert_eq!(result.unwrap_err(), InsightsError::MissingKind);
    }

    #[test]
    fn build_populates_identity_and_fingerprint() {
        let event = ErrorEvent::builder()
            .kind(EventKind::Async)
            .details(ErrorDetails::from_parts("app::DbError", "boom"))
            .build()
            .unwrap();

        assert!(!event.id.is_empty());
        assert!(!event.fingerprint.is_empty());
        assert_eq!(event.kind, EventKind::Async);
        assert!(event.http.is_none());

        let other = ErrorEvent::builder()
            .kind(EventKind::Async)
            .details(ErrorDetails::from_parts("app::DbError", "boom"))
            .build()
            .unwrap();
        assert_ne!(event.id, other.id);
        assert_eq!(event.fingerprint, other.fingerprint);
    }

    #[test]
    fn build_captures_from_live_error() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk offline");
        let event = ErrorEvent::builder()
            .kind(EventKind::Scheduled)
            .error(&err)
            .build()
            .unwrap();

        assert!(event.error.kind.contains("io::Error") || event.error.kind.contains("io::error"));
        assert_eq!(event.error.message, "disk offline");
    }

    #[test]
    fn context_and_http_are_copied_in() {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        let event = ErrorEvent::builder()
            .kind(EventKind::HttpRequest)
            .details(ErrorDetails::from_parts("app::Rejected", "bad payload"))
            .http(HttpContext {
                method: "POST".to_string(),
                uri: "/users".to_string(),
                headers: headers.clone(),
                body: Some("{}".to_string()),
            })
            .context("handler", "create_user")
            .build()
            .unwrap();

        // Later changes to the caller's map must not reach the event.
        headers.insert("x-extra".to_string(), "1".to_string());

        let http = event.http.unwrap();
        assert_eq!(http.method, "POST");
        assert_eq!(http.headers.len(), 1);
        assert_eq!(event.context.get("handler").map(String::as_str), Some("create_user"));
    }

    #[test]
    fn recent_logs_are_a_frozen_copy() {
        let mut lines = vec![LogLine::new(LogSeverity::Warn, "app", "before")];
        let event = ErrorEvent::builder()
            .kind(EventKind::EventListener)
            .details(ErrorDetails::from_parts("app::Lost", "listener died"))
            .recent_logs(lines.clone())
            .build()
            .unwrap();

        lines.push(LogLine::new(LogSeverity::Error, "app", "after"));
        assert_eq!(event.recent_logs.len(), 1);
        assert_eq!(event.recent_logs[0].message, "before");
    }

    #[test]
    fn serializes_with_snake_case_kind() {
        let event = ErrorEvent::builder()
            .kind(EventKind::UncaughtThread)
            .details(ErrorDetails::from_parts("app::Panic", "worker panicked"))
            .build()
            .unwrap();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "uncaught_thread");
        assert_eq!(json["error"]["message"], "worker panicked");
        assert!(json["http"].is_null());
        assert_eq!(json["fingerprint"], event.fingerprint);
    }

    #[test]
    fn timestamp_defaults_to_build_time() {
        let before = Utc::now();
        let event = ErrorEvent::builder()
            .kind(EventKind::Async)
            .details(ErrorDetails::from_parts("app::DbError", "boom"))
            .build()
            .unwrap();
        let after = Utc::now();

        assert!(event.timestamp >= before && event.timestamp <= after);
    }
}
