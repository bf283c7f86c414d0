use serde::Serialize;

use phplens_types::{LogEntry, Severity};

/// Counts per severity class
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub fatal: usize,
    pub parse: usize,
    pub error: usize,
    pub warning: usize,
    pub notice: usize,
    pub deprecated: usize,
    pub strict: usize,
    pub info: usize,
    pub unknown: usize,
    pub context: usize,
}

impl SeverityCounts {
    /// Tally a result set
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let mut counts = Self::default();

        for entry in entries {
            if entry.is_context {
                counts.context += 1;
                continue;
            }
            match entry.level() {
                Severity::Fatal => counts.fatal += 1,
                Severity::Parse => counts.parse += 1,
                Severity::Error => counts.error += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Notice => counts.notice += 1,
                Severity::Deprecated => counts.deprecated += 1,
                Severity::Strict => counts.strict += 1,
                Severity::Info => counts.info += 1,
                Severity::Unknown => counts.unknown += 1,
            }
        }

        counts
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Fatal => self.fatal,
            Severity::Parse => self.parse,
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Notice => self.notice,
            Severity::Deprecated => self.deprecated,
            Severity::Strict => self.strict,
            Severity::Info => self.info,
            Severity::Unknown => self.unknown,
        }
    }

    /// Non-zero classes, most severe first
    pub fn non_zero(&self) -> Vec<(Severity, usize)> {
        Severity::ALL
            .iter()
            .chain(std::iter::once(&Severity::Unknown))
            .map(|s| (*s, self.get(*s)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    /// Entries excluding context blocks
    pub fn total(&self) -> usize {
        self.fatal
            + self.parse
            + self.error
            + self.warning
            + self.notice
            + self.deprecated
            + self.strict
            + self.info
            + self.unknown
    }
}
