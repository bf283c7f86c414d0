//! Bounded reads of the most recent log entries.

use std::collections::HashSet;
use std::io::{self, Write};
use std::mem;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use phplens_types::{LogEntry, ParsedLine};

use crate::aggregator::EntryAggregator;
use crate::cache::{DEFAULT_CACHE_TTL, ExpiringCache, MemoryCache, cache_key};
use crate::error::Result;
use crate::filter::EntryFilter;
use crate::parser::{LineParser, ParserConfig};
use crate::reader::{DEFAULT_CHUNK_SIZE, ReverseLineReader};

/// Newest timestamp observed in a file
pub const LAST_TIMESTAMP_KEY: &str = "last_timestamp";
/// Newest timestamp the user has looked at
pub const LAST_SEEN_KEY: &str = "last_seen";
/// Number of entries newer than the last seen mark
pub const NEW_COUNT_KEY: &str = "new_count";

/// Default lifetime of the last seen mark (30 days)
pub const DEFAULT_SEEN_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Engine settings
#[derive(Clone, Debug)]
pub struct ReaderConfig {
    pub chunk_size: usize,
    pub parser: ParserConfig,

    /// TTL of the newest timestamp and new entry count
    pub cache_ttl: Duration,

    /// TTL of the last seen mark
    pub seen_ttl: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            parser: ParserConfig::default(),
            cache_ttl: DEFAULT_CACHE_TTL,
            seen_ttl: DEFAULT_SEEN_TTL,
        }
    }
}

/// Parameters of one read
#[derive(Clone, Debug)]
pub struct ReadRequest {
    /// Number of complete, kept entries wanted
    pub max_entries: usize,
    pub filter: EntryFilter,

    /// Stop at the first kept entry
    pub first_only: bool,

    /// Continue an earlier read from its resume offset
    pub start_offset: Option<u64>,
}

impl ReadRequest {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            filter: EntryFilter::default(),
            first_only: false,
            start_offset: None,
        }
    }

    pub fn with_filter(mut self, filter: EntryFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_disabled_severities<I, S>(mut self, severities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = self.filter.with_disabled_severities(severities);
        self
    }

    pub fn first_only(mut self) -> Self {
        self.first_only = true;
        self
    }

    pub fn starting_at(mut self, offset: u64) -> Self {
        self.start_offset = Some(offset);
        self
    }

    fn budget(&self) -> usize {
        if self.first_only { 1 } else { self.max_entries }
    }
}

/// Result of one read
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReadPage {
    /// Kept entries, most recent first
    pub entries: Vec<LogEntry>,

    /// Where to continue for older entries; `None` once the start of the file was reached
    pub resume_offset: Option<u64>,

    /// Newest timestamp seen during this read
    pub newest_timestamp: Option<DateTime<Utc>>,

    /// False when the file changed underneath the read and the result is partial
    pub complete: bool,
}

/// Reads the last entries of PHP error logs
pub struct LogReader<C: ExpiringCache = MemoryCache> {
    config: ReaderConfig,
    cache: C,
}

impl<C: ExpiringCache> LogReader<C> {
    pub fn new(config: ReaderConfig, cache: C) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Return up to `max_entries` complete entries, most recent first
    pub fn read_last_entries(
        &self,
        path: impl AsRef<Path>,
        max_entries: usize,
        disabled_severities: &HashSet<String>,
        first_only: bool,
    ) -> Result<Vec<LogEntry>> {
        let mut request =
            ReadRequest::new(max_entries).with_disabled_severities(disabled_severities);
        if first_only {
            request = request.first_only();
        }
        self.read_page(path, &request, None).map(|page| page.entries)
    }

    /// Run one bounded backward read
    ///
    /// Lines of kept entries are copied to `mirror` in written order, one
    /// entry at a time, newest entry first.
    pub fn read_page(
        &self,
        path: impl AsRef<Path>,
        request: &ReadRequest,
        mirror: Option<&mut dyn Write>,
    ) -> Result<ReadPage> {
        let reader =
            ReverseLineReader::open(path, self.config.chunk_size, request.start_offset)?;
        self.read_from(reader, request, mirror)
    }

    fn read_from(
        &self,
        mut reader: ReverseLineReader,
        request: &ReadRequest,
        mut mirror: Option<&mut dyn Write>,
    ) -> Result<ReadPage> {
        let log_path = reader.path().to_path_buf();
        let path = log_path.as_path();
        let mut parser = LineParser::new(self.config.parser.clone());
        let mut aggregator = EntryAggregator::new(request.budget(), request.filter.clone());

        let mut entry_lines: Vec<String> = Vec::new();
        let mut interrupted = None;

        for item in reader.by_ref() {
            let raw = match item {
                Ok(raw) => raw,
                Err(err) => {
                    interrupted = Some(err);
                    break;
                }
            };

            let parsed = parser.parse(&raw.text);
            let is_context = matches!(parsed, ParsedLine::ContextBlock { .. });
            if mirror.is_some() {
                entry_lines.push(raw.text);
            }

            let control = aggregator.feed(parsed, raw.offset);
            if control.line_done {
                let sealed = if is_context {
                    entry_lines.split_off(entry_lines.len().saturating_sub(1))
                } else {
                    mem::take(&mut entry_lines)
                };
                mirror_lines(&mut mirror, &sealed, control.no_flush, path);
            }
            if control.close {
                break;
            }
        }

        if interrupted.is_none() && !aggregator.is_done() {
            let control = aggregator.finish();
            if control.line_done {
                mirror_lines(&mut mirror, &entry_lines, control.no_flush, path);
            }
        }

        if let Some(writer) = mirror.as_mut() {
            if let Err(err) = writer.flush() {
                warn!(path = %path.display(), error = %err, "failed to flush mirror");
            }
        }

        let complete = interrupted.is_none();
        if let Some(err) = interrupted {
            if aggregator.entries().is_empty() {
                return Err(err);
            }
            warn!(
                path = %path.display(),
                entries = aggregator.entries().len(),
                "log changed during read; returning partial result"
            );
        }

        let resume_offset = if complete && aggregator.is_done() && !reader.at_start() {
            aggregator.earliest_sealed().filter(|offset| *offset > 0)
        } else {
            None
        };

        let newest_timestamp = parser.last_timestamp();
        if let Some(ts) = newest_timestamp {
            self.record_newest(path, ts);
        }

        debug!(
            path = %path.display(),
            chunks = reader.chunks_read(),
            kept = aggregator.entries().len(),
            discarded = aggregator.discarded(),
            resume_offset = ?resume_offset,
            "read pass finished"
        );

        Ok(ReadPage {
            entries: aggregator.into_entries(),
            resume_offset,
            newest_timestamp,
            complete,
        })
    }

    /// Count entries newer than the last seen mark, up to `limit`
    ///
    /// Without a mark every entry counts. The count is cached for the
    /// configured TTL.
    pub fn new_entries_count(&self, path: impl AsRef<Path>, limit: usize) -> Result<usize> {
        let path = path.as_ref();
        let count_key = cache_key(NEW_COUNT_KEY, path);
        let cached = self
            .cache
            .get(&count_key)
            .and_then(|v| serde_json::from_value::<CachedCount>(v).ok());
        if let Some(cached) = cached.filter(|c| c.covers(limit)) {
            return Ok(cached.count.min(limit));
        }

        let since = self.last_seen(path);
        let is_seen =
            |entry: &LogEntry| since.is_some_and(|s| entry.timestamp.is_some_and(|t| t <= s));

        let mut reader = ReverseLineReader::open(path, self.config.chunk_size, None)?;
        let mut parser = LineParser::new(self.config.parser.clone());
        let mut aggregator = EntryAggregator::new(limit.saturating_add(1), EntryFilter::default());

        let mut reached_seen = false;
        for item in reader.by_ref() {
            // Best effort: count what was read before the file changed
            let Ok(raw) = item else { break };
            let control = aggregator.feed(parser.parse(&raw.text), raw.offset);
            if control.line_done
                && aggregator
                    .entries()
                    .last()
                    .is_some_and(|e| !e.is_context && is_seen(e))
            {
                reached_seen = true;
                break;
            }
            if control.close {
                break;
            }
        }
        if !reached_seen {
            aggregator.finish();
        }

        let count = aggregator
            .entries()
            .iter()
            .filter(|e| !e.is_context && !is_seen(e))
            .count()
            .min(limit);

        if let Ok(value) = serde_json::to_value(CachedCount { count, limit }) {
            self.cache.set(&count_key, value, self.config.cache_ttl);
        }
        if let Some(ts) = parser.last_timestamp() {
            self.record_newest(path, ts);
        }
        Ok(count)
    }

    /// Record that entries up to `ts` have been looked at
    pub fn mark_seen(&self, path: impl AsRef<Path>, ts: DateTime<Utc>) {
        let path = path.as_ref();
        self.cache
            .set_timestamp(&cache_key(LAST_SEEN_KEY, path), ts, self.config.seen_ttl);
        self.cache.remove(&cache_key(NEW_COUNT_KEY, path));
    }

    pub fn last_seen(&self, path: impl AsRef<Path>) -> Option<DateTime<Utc>> {
        self.cache
            .get_timestamp(&cache_key(LAST_SEEN_KEY, path.as_ref()))
    }

    /// Newest timestamp recorded by an earlier read, if not expired
    pub fn cached_newest_timestamp(&self, path: impl AsRef<Path>) -> Option<DateTime<Utc>> {
        self.cache
            .get_timestamp(&cache_key(LAST_TIMESTAMP_KEY, path.as_ref()))
    }

    /// Drop all cached bookkeeping for a file
    pub fn forget(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        for kind in [LAST_TIMESTAMP_KEY, LAST_SEEN_KEY, NEW_COUNT_KEY] {
            self.cache.remove(&cache_key(kind, path));
        }
    }

    fn record_newest(&self, path: &Path, ts: DateTime<Utc>) {
        let key = cache_key(LAST_TIMESTAMP_KEY, path);
        let current = self.cache.get_timestamp(&key);
        if current.is_none_or(|current| ts > current) {
            self.cache.set_timestamp(&key, ts, self.config.cache_ttl);
        }
    }
}

impl Default for LogReader<MemoryCache> {
    fn default() -> Self {
        Self::new(ReaderConfig::default(), MemoryCache::new())
    }
}

/// New entry count together with the limit it was capped at
#[derive(Debug, Serialize, Deserialize)]
struct CachedCount {
    count: usize,
    limit: usize,
}

impl CachedCount {
    /// Whether the count answers a request with this limit
    fn covers(&self, limit: usize) -> bool {
        self.count < self.limit || limit <= self.limit
    }
}

/// Write the lines of a sealed entry unless it was filtered out
///
/// A failing mirror is dropped so the read itself can finish.
fn mirror_lines(mirror: &mut Option<&mut dyn Write>, lines: &[String], no_flush: bool, path: &Path) {
    let result = match mirror.as_mut() {
        Some(writer) if !no_flush => write_lines(writer, lines),
        _ => Ok(()),
    };
    if let Err(err) = result {
        warn!(path = %path.display(), error = %err, "mirror write failed; disabling mirror");
        *mirror = None;
    }
}

fn write_lines<W: Write + ?Sized>(writer: &mut W, lines: &[String]) -> io::Result<()> {
    // Collected newest first
    for line in lines.iter().rev() {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use chrono::TimeZone;
    use chrono_tz::Tz;
    use std::fs::OpenOptions;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn php_line(second: u32, severity: &str, message: &str) -> String {
        format!("[16-Oct-2026 10:00:{second:02} UTC] PHP {severity}:  {message}\n")
    }

    fn write_log(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    fn reader(chunk_size: usize) -> LogReader {
        LogReader::new(
            ReaderConfig {
                chunk_size,
                parser: ParserConfig {
                    timezone: Tz::UTC,
                    verify_source_files: false,
                },
                ..ReaderConfig::default()
            },
            MemoryCache::new(),
        )
    }

    fn messages(entries: &[LogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.message.as_str()).collect()
    }

    fn simple_log(count: u32) -> NamedTempFile {
        let content: String = (0..count)
            .map(|i| php_line(i, "Warning", &format!("entry {i}")))
            .collect();
        write_log(content.as_bytes())
    }

    fn traced_log() -> String {
        let mut content = String::new();
        content.push_str(&php_line(1, "Notice", "first notice"));
        content.push_str(&php_line(
            2,
            "Fatal error",
            "Uncaught Exception: boom in /var/www/a.php:12",
        ));
        content.push_str("Stack trace:\n");
        content.push_str("#0 /var/www/b.php(7): do_boom()\n");
        content.push_str("#1 [internal function]: Runner->run(Array)\n");
        content.push_str("#2 /var/www/index.php(3): main()\n");
        content.push_str("#3 {main}\n");
        content.push_str("  thrown in /var/www/a.php on line 12\n");
        content.push_str(&php_line(3, "Deprecated", "old api"));
        content
    }

    #[test]
    fn test_budget_exactness() {
        let file = simple_log(10);
        let entries = reader(64)
            .read_last_entries(file.path(), 3, &HashSet::new(), false)
            .unwrap();
        assert_eq!(messages(&entries), vec!["entry 9", "entry 8", "entry 7"]);
    }

    #[test]
    fn test_budget_larger_than_file() {
        let file = simple_log(2);
        let entries = reader(64)
            .read_last_entries(file.path(), 50, &HashSet::new(), false)
            .unwrap();
        assert_eq!(messages(&entries), vec!["entry 1", "entry 0"]);
    }

    #[test]
    fn test_stack_frames_in_written_order() {
        let file = write_log(traced_log().as_bytes());
        let entries = reader(16)
            .read_last_entries(file.path(), 2, &HashSet::new(), false)
            .unwrap();

        assert_eq!(entries[0].severity, "deprecated");
        let fatal = &entries[1];
        assert_eq!(fatal.severity, "fatal");
        let indexes: Vec<_> = fatal.sub_items.iter().map(|f| f.index).collect();
        assert_eq!(indexes, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert_eq!(fatal.sub_items[0].file.as_deref(), Some("/var/www/b.php"));
        assert_eq!(
            fatal.message,
            "Uncaught Exception: boom in /var/www/a.php:12\nStack trace:\n  thrown in /var/www/a.php on line 12"
        );
        assert_eq!(fatal.error_file.as_deref(), Some("/var/www/a.php"));
        assert_eq!(fatal.error_line, Some(12));
        assert_eq!(fatal.raw_lines, 7);
    }

    #[test]
    fn test_filtering_does_not_under_count() {
        let content: String = (0..12)
            .map(|i| {
                let severity = if i % 2 == 0 { "Notice" } else { "Warning" };
                php_line(i, severity, &format!("entry {i}"))
            })
            .collect();
        let file = write_log(content.as_bytes());
        let disabled: HashSet<String> = ["notice".to_string()].into();

        let entries = reader(32)
            .read_last_entries(file.path(), 4, &disabled, false)
            .unwrap();
        assert_eq!(entries.len(), 4);
        assert!(entries.iter().all(|e| e.severity == "warning"));
        assert_eq!(messages(&entries), vec!["entry 11", "entry 9", "entry 7", "entry 5"]);
    }

    #[test]
    fn test_idempotent_reads() {
        let file = write_log(traced_log().as_bytes());
        let reader = reader(8);
        let first = reader
            .read_last_entries(file.path(), 10, &HashSet::new(), false)
            .unwrap();
        let second = reader
            .read_last_entries(file.path(), 10, &HashSet::new(), false)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_results_independent_of_chunk_size() {
        let file = write_log(traced_log().as_bytes());
        let expected = reader(DEFAULT_CHUNK_SIZE)
            .read_last_entries(file.path(), 10, &HashSet::new(), false)
            .unwrap();
        assert_eq!(expected.len(), 3);

        for chunk_size in [1, 7, 10, 16, 64, 1000] {
            let entries = reader(chunk_size)
                .read_last_entries(file.path(), 10, &HashSet::new(), false)
                .unwrap();
            assert_eq!(entries, expected, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_context_block_entry() {
        let mut content = php_line(1, "Warning", "with context");
        content.push_str("[ELM_context_42]{\"a\":1}[/ELM_context_42]\n");
        let file = write_log(content.as_bytes());

        let entries = reader(64)
            .read_last_entries(file.path(), 1, &HashSet::new(), false)
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].is_context);
        assert_eq!(
            entries[0].context_payload.clone().map(serde_json::Value::Object),
            Some(serde_json::json!({"a": 1, "parentEntryPosition": "next"}))
        );
        assert_eq!(entries[1].message, "with context");
    }

    #[test]
    fn test_garbage_appended_to_open_entry() {
        let mut content = php_line(1, "Warning", "boom").into_bytes();
        content.extend_from_slice(&[0xff, 0xfe, 0x00, 0x01, b'#', 0x80, b'\n']);
        let file = write_log(&content);

        let entries = reader(4)
            .read_last_entries(file.path(), 5, &HashSet::new(), false)
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.starts_with("boom\n"));
        assert!(entries[0].message.contains('\u{FFFD}'));
    }

    #[test]
    fn test_first_only() {
        let file = simple_log(5);
        let entries = reader(64)
            .read_last_entries(file.path(), 100, &HashSet::new(), true)
            .unwrap();
        assert_eq!(messages(&entries), vec!["entry 4"]);
    }

    #[test]
    fn test_resume_offset_pages_through_file() {
        let file = simple_log(5);
        let reader = reader(16);

        let first = reader.read_page(file.path(), &ReadRequest::new(2), None).unwrap();
        assert_eq!(messages(&first.entries), vec!["entry 4", "entry 3"]);
        let offset = first.resume_offset.unwrap();
        assert_eq!(offset, first.entries[1].offset);

        let second = reader
            .read_page(file.path(), &ReadRequest::new(2).starting_at(offset), None)
            .unwrap();
        assert_eq!(messages(&second.entries), vec!["entry 2", "entry 1"]);

        let third = reader
            .read_page(
                file.path(),
                &ReadRequest::new(2).starting_at(second.resume_offset.unwrap()),
                None,
            )
            .unwrap();
        assert_eq!(messages(&third.entries), vec!["entry 0"]);
        assert_eq!(third.resume_offset, None);
        assert!(third.complete);
    }

    #[test]
    fn test_mirror_skips_filtered_entries() {
        let file = write_log(traced_log().as_bytes());
        let request = ReadRequest::new(10).with_disabled_severities(["deprecated"]);
        let mut mirror = Vec::new();

        let page = reader(16)
            .read_page(file.path(), &request, Some(&mut mirror))
            .unwrap();
        assert_eq!(page.entries.len(), 2);

        let mirrored = String::from_utf8(mirror).unwrap();
        assert!(!mirrored.contains("old api"));
        let fatal_start = mirrored.find("Fatal error").unwrap();
        let frame0 = mirrored.find("#0 /var/www/b.php").unwrap();
        let frame3 = mirrored.find("#3 {main}").unwrap();
        let notice = mirrored.find("first notice").unwrap();
        assert!(fatal_start < frame0 && frame0 < frame3);
        assert!(frame3 < notice);
    }

    #[test]
    fn test_missing_file() {
        let result = reader(64).read_last_entries(
            "/definitely/not/here.log",
            10,
            &HashSet::new(),
            false,
        );
        assert!(matches!(result, Err(ReadError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_file() {
        let file = write_log(b"");
        let page = reader(64)
            .read_page(file.path(), &ReadRequest::new(10), None)
            .unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.resume_offset, None);
        assert!(page.complete);
    }

    #[test]
    fn test_leading_orphan_lines_become_entry() {
        let mut content = String::from("#4 /var/www/x.php(1): cut()\n#5 {main}\n");
        content.push_str(&php_line(9, "Warning", "after rotation"));
        let file = write_log(content.as_bytes());

        let entries = reader(64)
            .read_last_entries(file.path(), 10, &HashSet::new(), false)
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].severity, "");
        assert_eq!(entries[1].sub_items.len(), 2);
        assert_eq!(entries[1].offset, 0);
    }

    #[test]
    fn test_newest_timestamp_is_cached() {
        let file = simple_log(3);
        let reader = reader(64);
        let page = reader.read_page(file.path(), &ReadRequest::new(1), None).unwrap();

        let newest = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 2).unwrap();
        assert_eq!(page.newest_timestamp, Some(newest));
        assert_eq!(reader.cached_newest_timestamp(file.path()), Some(newest));

        // An older page does not move the mark backwards
        reader
            .read_page(file.path(), &ReadRequest::new(1).starting_at(page.resume_offset.unwrap()), None)
            .unwrap();
        assert_eq!(reader.cached_newest_timestamp(file.path()), Some(newest));
    }

    #[test]
    fn test_new_entries_count() {
        let file = simple_log(3);
        let reader = reader(64);

        assert_eq!(reader.new_entries_count(file.path(), 100).unwrap(), 3);

        reader.mark_seen(file.path(), Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 1).unwrap());
        assert_eq!(reader.new_entries_count(file.path(), 100).unwrap(), 1);

        reader.forget(file.path());
        assert_eq!(reader.last_seen(file.path()), None);
        assert_eq!(reader.new_entries_count(file.path(), 2).unwrap(), 2);
    }

    #[test]
    fn test_cached_count_respects_larger_limit() {
        let file = simple_log(10);
        let reader = reader(64);

        assert_eq!(reader.new_entries_count(file.path(), 2).unwrap(), 2);
        assert_eq!(reader.new_entries_count(file.path(), 100).unwrap(), 10);
        assert_eq!(reader.new_entries_count(file.path(), 5).unwrap(), 5);
        assert_eq!(reader.new_entries_count(file.path(), 1000).unwrap(), 10);
    }

    /// Empties the log the first time an entry is mirrored
    struct TruncatingMirror {
        log: PathBuf,
        truncated: bool,
    }

    impl Write for TruncatingMirror {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.truncated {
                self.truncated = true;
                OpenOptions::new().write(true).open(&self.log)?.set_len(0)?;
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_emptied_mid_read_returns_partial_page() {
        let file = simple_log(20);
        let mut mirror = TruncatingMirror {
            log: file.path().to_path_buf(),
            truncated: false,
        };

        let page = reader(16)
            .read_page(file.path(), &ReadRequest::new(20), Some(&mut mirror))
            .unwrap();
        assert!(!page.complete);
        assert_eq!(messages(&page.entries), vec!["entry 19"]);
        assert_eq!(page.resume_offset, None);
    }

    #[test]
    fn test_log_emptied_before_any_entry_is_an_error() {
        let file = simple_log(5);
        let lines = ReverseLineReader::open(file.path(), 16, None).unwrap();
        OpenOptions::new()
            .write(true)
            .open(file.path())
            .unwrap()
            .set_len(0)
            .unwrap();

        let result = reader(16).read_from(lines, &ReadRequest::new(5), None);
        assert!(matches!(result, Err(ReadError::FileVanishedDuringRead(_))));
    }
}
