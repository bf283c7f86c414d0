use std::fs;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;

use phplens_types::{EntryStart, ParsedLine, Severity};

use crate::context::{is_context_block, parse_context_block};
use crate::frame::{FrameParser, compile};
use crate::timestamp::parse_timestamp;

/// `[timestamp] PHP Severity: message`, every part but the message optional
const ENTRY_START_PATTERN: &str = r"^(?:\[(?P<timestamp>[^\]]{6,50})\]\s*)?(?:(?P<source>PHP|WordPress database)\s+)?(?:(?P<severity>[A-Za-z][A-Za-z ]{3,39}):(?:\s+|$))?(?P<message>.*)$";

/// Parser settings
#[derive(Clone, Debug)]
pub struct ParserConfig {
    /// Zone used for timestamps written without one
    pub timezone: Tz,

    /// Keep extracted file/line pairs only when the file exists on disk
    pub verify_source_files: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            verify_source_files: true,
        }
    }
}

/// Classifies raw PHP error log lines
///
/// One instance serves one read request: it tracks the newest timestamp
/// seen so far.
pub struct LineParser {
    config: ParserConfig,
    entry_start: Regex,
    location_on_line: Regex,
    location_colon: Regex,
    frames: FrameParser,
    last_timestamp: Option<DateTime<Utc>>,
}

impl LineParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            entry_start: compile(ENTRY_START_PATTERN),
            location_on_line: compile(r"\bin (?P<file>\S+) on line (?P<line>\d+)"),
            location_colon: compile(
                r"(?P<file>(?:[A-Za-z]:)?[/\\][^\s:()]+\.[A-Za-z0-9]+):(?P<line>\d+)",
            ),
            frames: FrameParser::new(),
            last_timestamp: None,
        }
    }

    /// Newest timestamp parsed so far
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }

    /// Classify a single raw line. Never fails.
    pub fn parse(&mut self, line: &str) -> ParsedLine {
        let trimmed = line.trim_start();

        if self.frames.looks_like_frame(trimmed) {
            if let Some(frame) = self.frames.parse(trimmed) {
                return ParsedLine::StackFrame(frame);
            }
        }

        if is_context_block(trimmed) {
            return context_or_continuation(line);
        }

        let Some(caps) = self.entry_start.captures(line) else {
            return ParsedLine::Continuation(line.to_string());
        };

        let raw_timestamp = caps.name("timestamp").map(|m| m.as_str());
        let source = caps.name("source");
        let severity = caps.name("severity");
        let message = caps.name("message").map_or("", |m| m.as_str());

        // Everything after the timestamp bracket
        let body_start = source
            .or(severity)
            .or(caps.name("message"))
            .map_or(0, |m| m.start());
        let body = &line[body_start..];

        if raw_timestamp.is_some() && is_context_block(message) && source.is_none() {
            return context_or_continuation(message);
        }

        let timestamp = raw_timestamp.and_then(|raw| parse_timestamp(raw, self.config.timezone));

        // A bare `Word:` prefix is not enough to open an entry
        let is_boundary = timestamp.is_some()
            || source.is_some()
            || (raw_timestamp.is_some() && severity.is_some());
        if !is_boundary {
            return ParsedLine::Continuation(line.to_string());
        }

        let mut start = EntryStart {
            timestamp,
            ..EntryStart::default()
        };

        let severity_label = severity
            .map(|m| Severity::normalize(m.as_str()))
            .unwrap_or_default();

        match source.map(|m| m.as_str()) {
            Some("WordPress database") => {
                start.source = "wordpress database".to_string();
                let rest = line[source.map_or(0, |m| m.end())..].trim_start();
                match rest.strip_prefix("error") {
                    Some(after) => {
                        start.severity = "error".to_string();
                        start.message = after.trim().to_string();
                    }
                    None => start.message = rest.trim().to_string(),
                }
            }
            other => {
                start.source = other.map(str::to_lowercase).unwrap_or_default();
                start.severity = severity_label;
                start.message = message.trim().to_string();
            }
        }

        if start.severity == "stack trace" {
            return ParsedLine::Continuation(body.trim_end().to_string());
        }

        if start.severity.is_empty() {
            if let Some(frame) = self.frames.parse_xdebug(&start.message) {
                return ParsedLine::StackFrame(frame);
            }
        }

        if let Some(ts) = timestamp {
            if self.last_timestamp.is_none_or(|last| ts > last) {
                self.last_timestamp = Some(ts);
            }
        }

        if let Some((file, line_no)) = self.extract_location(&start.message) {
            start.error_file = Some(file);
            start.error_line = Some(line_no);
        }

        ParsedLine::EntryStart(start)
    }

    /// Find `in <file> on line <N>` or `<file>:<N>` in a message
    fn extract_location(&self, message: &str) -> Option<(String, u32)> {
        let caps = self
            .location_on_line
            .captures(message)
            .or_else(|| self.location_colon.captures(message))?;

        let file = caps["file"].to_string();
        let line = caps["line"].parse().ok()?;

        if self.config.verify_source_files && !source_file_exists(&file) {
            return None;
        }
        Some((file, line))
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

fn context_or_continuation(text: &str) -> ParsedLine {
    match parse_context_block(text) {
        Some((id, payload)) => ParsedLine::ContextBlock { id, payload },
        None => ParsedLine::Continuation(text.to_string()),
    }
}

/// Paths outside an accessible root must not fail classification
fn source_file_exists(path: &str) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file(),
        Err(_) => false,
    }
}
