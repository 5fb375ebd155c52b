//! Condensed view of a stored event for the downstream explanation step.

use serde::Serialize;

use crate::event::{ErrorEvent, EventKind};

/// Stack frames included in a prompt context.
pub const MAX_PROMPT_FRAMES: usize = 8;

/// Log lines included in a prompt context.
pub const MAX_PROMPT_LOG_LINES: usize = 8;

/// Everything a prompt builder needs, already trimmed and rendered.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PromptContext {
    pub error_kind: String,
    pub error_message: String,
    /// Top frames, rendered one per line.
    pub top_frames: Vec<String>,
    /// Last few WARN/ERROR lines as `LEVEL target - message`.
    pub recent_logs: Vec<String>,
    /// What kind of execution this was, e.g. `GET /users`.
    pub execution_context: String,
}

impl PromptContext {
    pub fn from_event(event: &ErrorEvent) -> Self {
        Self {
            error_kind: event.error.kind.clone(),
            error_message: event.error.message.clone(),
            top_frames: event
                .error
                .frames
                .iter()
                .take(MAX_PROMPT_FRAMES)
                .map(|frame| frame.render())
                .collect(),
            recent_logs: event
                .recent_logs
                .iter()
                .filter(|line| line.severity.is_warning_or_worse())
                .take(MAX_PROMPT_LOG_LINES)
                .map(|line| format!("{} {} - {}", line.severity.as_str(), line.target, line.message))
                .collect(),
            execution_context: execution_context(event),
        }
    }
}

fn execution_context(event: &ErrorEvent) -> String {
    match event.kind {
        EventKind::HttpRequest => match &event.http {
            Some(http) => format!("{} {}", http.method, http.uri),
            None => "HTTP request".to_string(),
        },
        EventKind::Scheduled => "Scheduled task".to_string(),
        EventKind::Async => "Async execution".to_string(),
        EventKind::UncaughtThread => "Uncaught thread panic".to_string(),
        other => other.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::HttpContext;
    use crate::log_buffer::{LogLine, LogSeverity};
    use crate::trace::{ErrorDetails, TraceFrame};

    fn base_event(kind: EventKind) -> ErrorEvent {
        ErrorEvent::builder()
            .kind(kind)
            .details(ErrorDetails::from_parts("app::DbError", "query failed"))
            .build()
            .unwrap()
    }

    #[test]
    fn http_events_render_method_and_uri() {
        let mut event = base_event(EventKind::HttpRequest);
        event.http = Some(HttpContext {
            method: "GET".to_string(),
            uri: "/users".to_string(),
            ..HttpContext::default()
        });

        let context = PromptContext::from_event(&event);
        assert_eq!(context.execution_context, "GET /users");
        assert_eq!(context.error_kind, "app::DbError");
        assert_eq!(context.error_message, "query failed");
    }

    #[test]
    fn non_http_kinds_render_a_description() {
        assert_eq!(
            PromptContext::from_event(&base_event(EventKind::Scheduled)).execution_context,
            "Scheduled task"
        );
        assert_eq!(
            PromptContext::from_event(&base_event(EventKind::UncaughtThread)).execution_context,
            "Uncaught thread panic"
        );
        assert_eq!(
            PromptContext::from_event(&base_event(EventKind::Transactional)).execution_context,
            "transactional"
        );
    }

    #[test]
    fn frames_and_logs_are_trimmed() {
        let mut event = base_event(EventKind::Async);
        event.error.frames = (0..12)
            .map(|i| TraceFrame::new("app", format!("f{}", i), Some(i)))
            .collect();
        event.recent_logs = (0..12)
            .map(|i| LogLine::new(LogSeverity::Warn, "app", format!("line {}", i)))
            .collect();

        let context = PromptContext::from_event(&event);
        assert_eq!(context.top_frames.len(), MAX_PROMPT_FRAMES);
        assert_eq!(context.recent_logs.len(), MAX_PROMPT_LOG_LINES);
        assert_eq!(context.top_frames[0], "app::f0:0");
        assert_eq!(context.recent_logs[0], "WARN app - line 0");
    }

    #[test]
    fn sub_warn_lines_are_filtered_from_prompts() {
        let mut event = base_event(EventKind::Async);
        event.recent_logs = vec![
            LogLine::new(LogSeverity::Info, "app", "chatter"),
            LogLine::new(LogSeverity::Error, "app", "the real problem"),
        ];

        let context = PromptContext::from_event(&event);
        assert_eq!(context.recent_logs, vec!["ERROR app - the real problem"]);
    }
}
