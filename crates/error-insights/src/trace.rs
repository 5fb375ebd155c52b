//! Captured error details: type name, message, cause chain, stack frames.

use backtrace::Backtrace;
use serde::{Deserialize, Serialize};

/// Upper bound on frames kept per captured error.
pub const MAX_FRAMES: usize = 16;

/// One resolved stack frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceFrame {
    /// Module path of the declaring scope.
    pub module: String,
    pub function: String,
    pub line: Option<u32>,
}

impl TraceFrame {
    pub fn new(module: impl Into<String>, function: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
            line,
        }
    }

    /// Renders as `module::function:line`.
    pub fn render(&self) -> String {
        match self.line {
            Some(line) => format!("{}::{}:{}", self.module, self.function, line),
            None => format!("{}::{}", self.module, self.function),
        }
    }

    /// Captures up to `limit` symbolized frames at the current call site.
    ///
    /// Symbol resolution is best-effort: unresolvable frames are skipped and
    /// an empty result is valid. Frames belonging to the capture machinery
    /// itself are filtered out so the first frame is the caller's.
    pub fn capture_current(limit: usize) -> Vec<TraceFrame> {
        let trace = Backtrace::new();
        let mut frames = Vec::new();
        for frame in trace.frames() {
            for symbol in frame.symbols() {
                if frames.len() >= limit {
                    return frames;
                }
                let name = match symbol.name() {
                    Some(name) => name.to_string(),
                    None => continue,
                };
                if is_capture_machinery(&name) {
                    continue;
                }
                let (module, function) = split_symbol(&name);
                frames.push(TraceFrame {
                    module,
                    function,
                    line: symbol.lineno(),
                });
            }
        }
        frames
    }
}

fn is_capture_machinery(symbol: &str) -> bool {
    symbol.starts_with("backtrace::") || symbol.contains("error_insights::trace::")
}

/// Splits `path::to::module::function` into module path and bare function
/// name, dropping the trailing hash segment rustc appends to symbols.
fn split_symbol(name: &str) -> (String, String) {
    let trimmed = match name.rfind("::h") {
        Some(idx) if name[idx + 3..].chars().all(|c| c.is_ascii_hexdigit())
            && !name[idx + 3..].is_empty() =>
        {
            &name[..idx]
        }
        _ => name,
    };
    match trimmed.rfind("::") {
        Some(idx) => (trimmed[..idx].to_string(), trimmed[idx + 2..].to_string()),
        None => (String::new(), trimmed.to_string()),
    }
}

/// Snapshot of everything worth keeping about one observed error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetails {
    /// Type name of the outermost error.
    pub kind: String,
    pub message: String,
    /// Wrapped causes, outermost first. The last entry is the root cause.
    pub chain: Vec<String>,
    pub frames: Vec<TraceFrame>,
}

impl ErrorDetails {
    /// Snapshots a concrete error: its type name, display message, the full
    /// `source()` chain, and the frames of the current call site.
    pub fn capture<E>(err: &E) -> Self
    where
        E: std::error::Error,
    {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            chain,
            frames: TraceFrame::capture_current(MAX_FRAMES),
        }
    }

    /// Details without frame capture, for callers that only hold strings.
    pub fn from_parts(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            chain: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn with_frames(mut self, frames: Vec<TraceFrame>) -> Self {
        self.frames = frames;
        self
    }

    /// Innermost cause message, if the error wrapped one.
    pub fn root_cause(&self) -> Option<&str> {
        self.chain.last().map(String::as_str)
    }

    /// Multi-line stack text: header, one line per frame, then causes.
    pub fn render_trace(&self) -> String {
        let mut out = format!("{}: {}\n", self.kind, self.message);
        for frame in &self.frames {
            out.push_str("    at ");
            out.push_str(&frame.render());
            out.push('\n');
        }
        for cause in &self.chain {
            out.push_str("caused by: ");
            out.push_str(cause);
            out.push('\n');
        }
        out
    }
}
