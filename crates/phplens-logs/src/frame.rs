use regex::Regex;

use phplens_types::StackFrame;

/// Parser for PHP backtrace lines (`#0 /path/file.php(12): call()`)
#[derive(Clone, Debug)]
pub struct FrameParser {
    prefix: Regex,
    main: Regex,
    internal: Regex,
    standard: Regex,
    truncated: Regex,
    loose: Regex,
    xdebug: Regex,
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            prefix: compile(r"^\s*#\d+"),
            main: compile(r"^#(?P<index>\d+)\s+\{main\}\s*$"),
            internal: compile(r"^#(?P<index>\d+)\s+\[internal function\]:\s*(?P<call>.*)$"),
            standard: compile(r"^#(?P<index>\d+)\s+(?P<file>.+?)\((?P<line>\d+)\):\s*(?P<call>.*)$"),
            truncated: compile(
                r"^#(?P<index>\d+)\s+(?P<call>.*?)(?:\s+in\s+(?P<file>\S+))?\s+on line\s+(?P<line>\d+)\s*$",
            ),
            loose: compile(r"^#(?P<index>\d+)\s*(?P<call>.*)$"),
            xdebug: compile(r"^\s*(?P<index>\d+)\.\s+(?P<call>.+?)\s+(?P<file>\S+):(?P<line>\d+)\s*$"),
        }
    }

    /// Whether the line starts with a `#<digits>` frame marker
    pub fn looks_like_frame(&self, line: &str) -> bool {
        self.prefix.is_match(line)
    }

    /// Parse a `#<index> ...` backtrace line
    ///
    /// Returns `None` only when the line has no frame marker at all.
    pub fn parse(&self, line: &str) -> Option<StackFrame> {
        let line = line.trim();

        if let Some(caps) = self.main.captures(line) {
            return Some(StackFrame::new(index(&caps), "{main}"));
        }

        if let Some(caps) = self.internal.captures(line) {
            return Some(StackFrame::new(index(&caps), caps["call"].trim()));
        }

        if let Some(caps) = self.standard.captures(line) {
            return Some(
                StackFrame::new(index(&caps), caps["call"].trim())
                    .at(caps["file"].trim(), caps["line"].parse().ok()),
            );
        }

        // Rotation can cut a trace mid-frame
        if let Some(caps) = self.truncated.captures(line) {
            let mut frame = StackFrame::new(index(&caps), caps["call"].trim());
            frame.file = caps.name("file").map(|m| m.as_str().to_string());
            frame.line = caps["line"].parse().ok();
            return Some(frame);
        }

        self.loose
            .captures(line)
            .map(|caps| StackFrame::new(index(&caps), caps["call"].trim()))
    }

    /// Parse an xdebug frame body such as `1. {main}() /var/www/index.php:0`
    pub fn parse_xdebug(&self, text: &str) -> Option<StackFrame> {
        let caps = self.xdebug.captures(text)?;
        Some(
            StackFrame::new(index(&caps), caps["call"].trim())
                .at(&caps["file"], caps["line"].parse().ok()),
        )
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

fn index(caps: &regex::Captures<'_>) -> Option<u32> {
    caps.name("index").and_then(|m| m.as_str().parse().ok())
}

pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid built-in pattern {pattern:?}: {err}"))
}
