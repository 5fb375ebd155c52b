//! Bounded ring buffer of recent WARN-or-worse log lines.
//!
//! Written on every qualifying log emission, read once when an error event
//! is built. The buffer keeps emission order and silently evicts the oldest
//! line to admit a new one once full.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogSeverity {
    pub fn is_error(&self) -> bool {
        matches!(self, LogSeverity::Error)
    }

    pub fn is_warning_or_worse(&self) -> bool {
        *self >= LogSeverity::Warn
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO",
            LogSeverity::Warn => "WARN",
            LogSeverity::Error => "ERROR",
        }
    }
}

impl From<&tracing::Level> for LogSeverity {
    fn from(level: &tracing::Level) -> Self {
        if *level == tracing::Level::ERROR {
            LogSeverity::Error
        } else if *level == tracing::Level::WARN {
            LogSeverity::Warn
        } else if *level == tracing::Level::INFO {
            LogSeverity::Info
        } else if *level == tracing::Level::DEBUG {
            LogSeverity::Debug
        } else {
            LogSeverity::Trace
        }
    }
}

/// A single captured log line. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogLine {
    pub severity: LogSeverity,
    pub message: String,
    /// Logger target (module path of the emitting code).
    pub target: String,
    /// Emitting thread name, when the thread has one.
    pub thread: Option<String>,
    /// Type of an error carried on the log call, when one was attached.
    pub error_kind: Option<String>,
    /// Message of an error carried on the log call.
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LogLine {
    pub fn new(
        severity: LogSeverity,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            target: target.into(),
            thread: None,
            error_kind: None,
            error_message: None,
            timestamp: Utc::now(),
        }
    }
}

/// Fixed-capacity FIFO of recent WARN+ log lines.
///
/// All operations take the same lock, so concurrent log-emitting threads
/// and snapshot readers always observe a consistent buffer.
pub struct LogRingBuffer {
    buffer: Mutex<VecDeque<LogLine>>,
    capacity: usize,
}

impl LogRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a line, evicting the oldest first when full.
    ///
    /// Lines below WARN are rejected. Capacity 0 is a valid configuration
    /// and behaves as a permanently empty buffer.
    pub fn record(&self, line: LogLine) {
        if !line.severity.is_warning_or_worse() {
            return;
        }
        if self.capacity == 0 {
            return;
        }
        let mut buffer = self.buffer.lock().unwrap();
        while buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(line);
    }

    /// Up to `limit` most-recently-recorded lines, oldest first, as owned
    /// copies. Never a live view.
    pub fn snapshot(&self, limit: usize) -> Vec<LogLine> {
        let buffer = self.buffer.lock().unwrap();
        let skip = buffer.len().saturating_sub(limit);
        buffer.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
