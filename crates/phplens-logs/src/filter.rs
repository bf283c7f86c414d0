use regex::Regex;
use std::collections::HashSet;

use phplens_types::{LogEntry, Severity};

/// Decides which sealed entries a read request keeps
#[derive(Clone, Default)]
pub struct EntryFilter {
    /// Regex pattern (if any)
    regex: Option<Regex>,

    /// Original pattern string
    pattern: String,

    /// Normalized severities to hide
    disabled: HashSet<String>,

    /// Whether to invert the text match
    invert: bool,
}

impl EntryFilter {
    /// Keep only entries whose message or file matches `pattern`
    ///
    /// An empty pattern matches everything.
    pub fn with_pattern(
        mut self,
        pattern: &str,
        case_insensitive: bool,
    ) -> Result<Self, regex::Error> {
        self.regex = if pattern.is_empty() {
            None
        } else if case_insensitive {
            Some(Regex::new(&format!("(?i){}", pattern))?)
        } else {
            Some(Regex::new(pattern)?)
        };
        self.pattern = pattern.to_string();
        Ok(self)
    }

    /// Hide entries with these severities
    pub fn with_disabled_severities<I, S>(mut self, severities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.disabled
            .extend(severities.into_iter().map(|s| Severity::normalize(s.as_ref())));
        self
    }

    /// Invert the text match
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Whether entries of this severity are hidden
    pub fn is_disabled(&self, severity: &str) -> bool {
        self.disabled.contains(severity)
    }

    /// Check if a sealed entry should be kept
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if entry.is_context {
            return true;
        }

        if self.is_disabled(&entry.severity) {
            return false;
        }

        let text_match = match &self.regex {
            Some(re) => {
                re.is_match(&entry.message)
                    || entry.error_file.as_deref().is_some_and(|f| re.is_match(f))
            }
            None => return true,
        };

        if self.invert { !text_match } else { text_match }
    }
}

impl std::fmt::Debug for EntryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryFilter")
            .field("pattern", &self.pattern)
            .field("disabled", &self.disabled)
            .field("invert", &self.invert)
            .finish()
    }
}

/// Quick filter presets
pub struct FilterPresets;

impl FilterPresets {
    /// Fatal, parse and plain errors only
    pub fn errors_only() -> EntryFilter {
        EntryFilter::default().with_disabled_severities([
            Severity::Warning.as_str(),
            Severity::Notice.as_str(),
            Severity::Deprecated.as_str(),
            Severity::Strict.as_str(),
            Severity::Info.as_str(),
        ])
    }

    /// Hide the noisy classes (notices, deprecations, strict standards)
    pub fn quiet() -> EntryFilter {
        EntryFilter::default().with_disabled_severities([
            Severity::Notice.as_str(),
            Severity::Deprecated.as_str(),
            Severity::Strict.as_str(),
        ])
    }
}
