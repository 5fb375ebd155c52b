//! `tracing` layer that mirrors WARN-or-worse events into the ring buffer.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::log_buffer::{LogLine, LogRingBuffer, LogSeverity};

/// Feeds qualifying log emissions into a shared [`LogRingBuffer`] so the
/// event builder can attach the lines that preceded an error.
///
/// Register it alongside the normal fmt layer; it never emits events of
/// its own.
pub struct LogCaptureLayer {
    buffer: Arc<LogRingBuffer>,
}

impl LogCaptureLayer {
    pub fn new(buffer: Arc<LogRingBuffer>) -> Self {
        Self { buffer }
    }
}

impl<S: Subscriber> Layer<S> for LogCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = LogSeverity::from(metadata.level());
        if !severity.is_warning_or_worse() {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        self.buffer.record(LogLine {
            severity,
            message: visitor.message.unwrap_or_default(),
            target: metadata.target().to_string(),
            thread: std::thread::current().name().map(str::to_string),
            error_kind: visitor.error_kind,
            error_message: visitor.error,
            timestamp: Utc::now(),
        });
    }
}

/// Pulls the `message` field plus the conventional `error` / `error_kind`
/// fields out of an event.
#[derive(Default)]
struct LineVisitor {
    message: Option<String>,
    error: Option<String>,
    error_kind: Option<String>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "error" => self.error = Some(value.to_string()),
            "error_kind" => self.error_kind = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" if self.message.is_none() => self.message = Some(format_value(value)),
            "error" if self.error.is_none() => self.error = Some(format_value(value)),
            "error_kind" if self.error_kind.is_none() => {
                self.error_kind = Some(format_value(value))
            }
            _ => {}
        }
    }
}

fn format_value(value: &dyn fmt::Debug) -> String {
    let rendered = format!("{value:?}");
    rendered.trim_matches('"').to_string()
}
