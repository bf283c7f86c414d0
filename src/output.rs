//! Text rendering of entries for the terminal.

use std::fmt::Write as _;

use chrono_tz::Tz;
use serde::Serialize;

use phplens_logs::{LogEntry, ReadPage, SeverityCounts};

/// JSON shape of `tail --json`
#[derive(Serialize)]
pub struct TailOutput<'a> {
    #[serde(flatten)]
    pub page: &'a ReadPage,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SeverityCounts>,
}

/// Render one entry, frames and continuation lines indented below the headline
pub fn format_entry(entry: &LogEntry, tz: Tz) -> String {
    let time = entry
        .timestamp
        .map(|ts| ts.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".repeat(19));

    if entry.is_context {
        let payload = entry
            .context_payload
            .as_ref()
            .and_then(|p| serde_json::to_string(p).ok())
            .unwrap_or_default();
        return format!("{} [CTX] {} {}", time, entry.message, payload);
    }

    let mut out = format!("{} [{}] {}", time, entry.level().short(), entry.headline());
    if let (Some(file), Some(line)) = (&entry.error_file, entry.error_line) {
        let _ = write!(out, " ({}:{})", file, line);
    }
    for line in entry.message.lines().skip(1) {
        let _ = write!(out, "\n    {}", line);
    }
    for frame in &entry.sub_items {
        let index = frame.index.map(|i| format!("#{i} ")).unwrap_or_default();
        let _ = write!(out, "\n    {}{}", index, frame.call);
        if let Some(file) = &frame.file {
            let _ = write!(out, " at {}", file);
            if let Some(line) = frame.line {
                let _ = write!(out, ":{}", line);
            }
        }
    }
    out
}

/// `fatal: 1  warning: 3`, most severe first
pub fn format_counts(counts: &SeverityCounts) -> String {
    let mut parts: Vec<String> = counts
        .non_zero()
        .into_iter()
        .map(|(severity, n)| format!("{}: {}", severity.as_str(), n))
        .collect();
    if counts.context > 0 {
        parts.push(format!("context: {}", counts.context));
    }
    if parts.is_empty() {
        return "no entries".to_string();
    }
    parts.join("  ")
}
