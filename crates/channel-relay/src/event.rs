//! Log event model: the unit of work flowing through the relay pipeline.
//!
//! Events are created by producers (adapters or library users), filtered and
//! transformed during the flush cycle, and possibly split into continuation
//! events by the clipper before being packed into outbound messages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::ANSI_RE;

/// Severity of a [`LogEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Uppercase display name, as used by the default line prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// One-character marker prepended to colorized lines. Under the `diff`
    /// highlight scheme `-` renders red and `!` renders orange, so warnings
    /// and errors stand out while info lines stay uncolored.
    pub fn symbol(self) -> &'static str {
        match self {
            LogLevel::Debug => "#",
            LogLevel::Info => " ",
            LogLevel::Warn => "!",
            LogLevel::Error => "-",
        }
    }

    /// All levels, in ascending severity order.
    pub fn all() -> [LogLevel; 4] {
        [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ]
    }
}

/// Structured error payload attached to a [`LogEvent`]: a display summary
/// plus the ordered chain of causes, rendered as a multi-line dump after the
/// message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    summary: String,
    causes: Vec<String>,
}

impl ErrorInfo {
    pub fn new(summary: impl Into<String>) -> Self {
        ErrorInfo {
            summary: summary.into(),
            causes: Vec::new(),
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Builds an [`ErrorInfo`] from a standard error, walking its source
    /// chain into the cause list.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut info = ErrorInfo::new(error.to_string());
        let mut source = error.source();
        while let Some(cause) = source {
            info.causes.push(cause.to_string());
            source = cause.source();
        }
        info
    }

    /// Renders the summary followed by one `caused by:` line per cause.
    pub fn render(&self) -> String {
        let mut out = self.summary.clone();
        for cause in &self.causes {
            out.push_str("\ncaused by: ");
            out.push_str(cause);
        }
        out
    }
}

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(0);

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// A loggable message from the application.
///
/// Either `message` or `error` must be present for the event to be emitted;
/// an event carrying neither is dropped silently during packing. The `id` is
/// a process-local monotonic counter that keys the outbound stack's set
/// semantics.
#[derive(Debug, Clone)]
pub struct LogEvent {
    id: u64,
    pub logger: String,
    pub timestamp_millis: i64,
    pub level: LogLevel,
    pub message: Option<String>,
    pub error: Option<ErrorInfo>,
}

impl LogEvent {
    /// Creates an event stamped with the current wall-clock time.
    pub fn new(logger: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        LogEvent {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            logger: logger.into(),
            timestamp_millis: now_millis(),
            level,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Creates an event with full control over every field.
    pub fn with_parts(
        logger: impl Into<String>,
        timestamp_millis: i64,
        level: LogLevel,
        message: Option<String>,
        error: Option<ErrorInfo>,
    ) -> Self {
        LogEvent {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            logger: logger.into(),
            timestamp_millis,
            level,
            message,
            error,
        }
    }

    /// Attaches a structured error payload.
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// True when the event carries neither message text nor an error
    /// payload, typically because a transformer cleared the message.
    pub fn is_empty(&self) -> bool {
        self.message.as_deref().map_or(true, str::is_empty) && self.error.is_none()
    }

    /// Number of characters in the raw message text.
    pub(crate) fn message_chars(&self) -> usize {
        self.message.as_deref().map_or(0, |m| m.chars().count())
    }

    /// Clones this event as a continuation carrying overflow text: same
    /// logger, timestamp, and level, but a fresh id and no error payload.
    /// The error dump rides with the first piece only.
    pub(crate) fn continuation(&self, message: String) -> Self {
        LogEvent {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            logger: self.logger.clone(),
            timestamp_millis: self.timestamp_millis,
            level: self.level,
            message: Some(message),
            error: None,
        }
    }

    /// Strips ANSI color escape sequences from producer text.
    pub fn strip_ansi(text: &str) -> String {
        ANSI_RE.replace_all(text, "").into_owned()
    }
}
