//! Shared types for phplens
//!
//! This crate contains the data structures passed between the log engine
//! and whatever renders its results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON object carried by an embedded context block
pub type ContextPayload = serde_json::Map<String, serde_json::Value>;

/// Key every context payload carries, defaulting to `"next"`
pub const PARENT_POSITION_KEY: &str = "parentEntryPosition";

// ============================================================================
// Severity
// ============================================================================

/// Normalized severity classes found in PHP error logs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Parse,
    Error,
    Warning,
    Notice,
    Deprecated,
    Strict,
    Info,
    #[default]
    Unknown,
}

impl Severity {
    /// All named classes, most severe first
    pub const ALL: [Severity; 8] = [
        Self::Fatal,
        Self::Parse,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Deprecated,
        Self::Strict,
        Self::Info,
    ];

    /// Normalize a raw severity label as written by PHP into its lowercase form
    ///
    /// `Fatal error` becomes `fatal`, `Parse error` becomes `parse`, and
    /// unrecognised labels are only lowercased.
    pub fn normalize(raw: &str) -> String {
        let lower = raw.trim().to_lowercase();
        let collapsed = lower.split_whitespace().collect::<Vec<_>>().join(" ");
        match collapsed.as_str() {
            "fatal error" | "recoverable fatal error" | "catchable fatal error" => {
                "fatal".to_string()
            }
            "parse error" => "parse".to_string(),
            "strict standards" => "strict".to_string(),
            _ => collapsed,
        }
    }

    /// Classify an already normalized severity label
    pub fn from_label(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "fatal" | "fatal error" | "core error" | "compile error" | "user error" => {
                Self::Fatal
            }
            "parse" | "parse error" => Self::Parse,
            "error" | "err" => Self::Error,
            "warning" | "warn" | "core warning" | "compile warning" | "user warning" => {
                Self::Warning
            }
            "notice" | "user notice" => Self::Notice,
            "deprecated" | "user deprecated" => Self::Deprecated,
            "strict" | "strict standards" => Self::Strict,
            "info" | "information" => Self::Info,
            _ => Self::Unknown,
        }
    }

    /// Lowercase name, matching the normalized label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Parse => "parse",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Deprecated => "deprecated",
            Self::Strict => "strict",
            Self::Info => "info",
            Self::Unknown => "unknown",
        }
    }

    /// Short display string (3 chars)
    pub fn short(&self) -> &'static str {
        match self {
            Self::Fatal => "FTL",
            Self::Parse => "PRS",
            Self::Error => "ERR",
            Self::Warning => "WRN",
            Self::Notice => "NOT",
            Self::Deprecated => "DEP",
            Self::Strict => "STR",
            Self::Info => "INF",
            Self::Unknown => "???",
        }
    }
}

// ============================================================================
// Parsed lines
// ============================================================================

/// One frame of a PHP backtrace
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StackFrame {
    /// Frame number as written (`#3` → 3)
    pub index: Option<u32>,

    /// Call site text, e.g. `Class->method()` or `{main}`
    pub call: String,

    pub file: Option<String>,
    pub line: Option<u32>,
}

impl StackFrame {
    pub fn new(index: Option<u32>, call: impl Into<String>) -> Self {
        Self {
            index,
            call: call.into(),
            file: None,
            line: None,
        }
    }

    /// Attach a source location
    pub fn at(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

/// Fields of a line that opens a new log entry
#[derive(Clone, Debug, PartialEq, Default)]
pub struct EntryStart {
    pub timestamp: Option<DateTime<Utc>>,

    /// Lowercased severity word, or empty
    pub severity: String,

    /// `php`, `wordpress database`, or empty
    pub source: String,

    pub message: String,
    pub error_file: Option<String>,
    pub error_line: Option<u32>,
}

/// Classification of a single physical log line
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedLine {
    EntryStart(EntryStart),
    StackFrame(StackFrame),
    ContextBlock { id: String, payload: ContextPayload },
    Continuation(String),
}

// ============================================================================
// Log entries
// ============================================================================

/// A fully reassembled log record
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct LogEntry {
    /// Message text, continuation lines joined with `\n`
    pub message: String,

    /// Parsed timestamp (if available)
    pub timestamp: Option<DateTime<Utc>>,

    pub severity: String,
    pub source: String,
    pub error_file: Option<String>,
    pub error_line: Option<u32>,

    /// Stack frames in written order (`#0` first)
    pub sub_items: Vec<StackFrame>,

    #[serde(rename = "isContext")]
    pub is_context: bool,

    #[serde(rename = "contextPayload")]
    pub context_payload: Option<ContextPayload>,

    /// Byte offset of the entry's first line
    pub offset: u64,

    /// Number of physical lines folded into this entry
    pub raw_lines: usize,
}

impl LogEntry {
    /// Create an entry from the fields of its opening line
    pub fn from_start(start: EntryStart, offset: u64) -> Self {
        Self {
            message: start.message,
            timestamp: start.timestamp,
            severity: start.severity,
            source: start.source,
            error_file: start.error_file,
            error_line: start.error_line,
            offset,
            raw_lines: 1,
            ..Self::default()
        }
    }

    /// Create an entry for an embedded context block
    pub fn context(id: &str, payload: ContextPayload, offset: u64) -> Self {
        Self {
            message: format!("context {}", id),
            is_context: true,
            context_payload: Some(payload),
            offset,
            raw_lines: 1,
            ..Self::default()
        }
    }

    /// Synthetic informational entry shown in place of a log that cannot be read
    pub fn notice(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: "info".to_string(),
            timestamp: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Severity class of this entry
    pub fn level(&self) -> Severity {
        Severity::from_label(&self.severity)
    }

    /// First line of the message
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
