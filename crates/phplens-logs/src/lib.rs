//! PHP error log reading for phplens
//!
//! This crate reads log files backwards in chunks, classifies each line,
//! and folds lines back into complete entries until a request's budget of
//! kept entries is met.

mod aggregator;
mod cache;
mod context;
mod engine;
mod error;
mod filter;
mod frame;
mod maintenance;
mod parser;
mod reader;
mod stats;
mod timestamp;

use std::collections::HashSet;
use std::path::Path;

pub use aggregator::{AggregatorState, EntryAggregator, LineControl};
pub use cache::{CachedValue, DEFAULT_CACHE_TTL, ExpiringCache, FileCache, MemoryCache, cache_key};
pub use context::{CONTEXT_OPEN, is_context_block, parse_context_block};
pub use engine::{
    DEFAULT_SEEN_TTL, LAST_SEEN_KEY, LAST_TIMESTAMP_KEY, LogReader, NEW_COUNT_KEY, ReadPage,
    ReadRequest, ReaderConfig,
};
pub use error::{LogError, ReadError, Result};
pub use filter::{EntryFilter, FilterPresets};
pub use frame::FrameParser;
pub use parser::{LineParser, ParserConfig};
pub use reader::{DEFAULT_CHUNK_SIZE, RawLine, ReverseLineReader};
pub use stats::SeverityCounts;
pub use timestamp::parse_timestamp;

// Re-export types used in our public API
pub use phplens_types::{EntryStart, LogEntry, ParsedLine, Severity, StackFrame};

/// Read the last entries of a log with default settings and a throwaway cache
pub fn read_last_entries(
    path: impl AsRef<Path>,
    max_entries: usize,
    disabled_severities: &HashSet<String>,
    first_only: bool,
) -> Result<Vec<LogEntry>> {
    LogReader::default().read_last_entries(path, max_entries, disabled_severities, first_only)
}
