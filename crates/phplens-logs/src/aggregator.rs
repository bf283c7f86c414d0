//! Folding backward-ordered lines into complete entries.
//!
//! Lines arrive newest first, so the frames and continuation lines of an
//! entry are seen before the line that opens it. They wait in `pending`
//! until that opening line seals the entry.

use std::mem;

use phplens_types::{LogEntry, ParsedLine, StackFrame};

use crate::filter::EntryFilter;

/// What the caller should do after feeding a line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineControl {
    /// The line completed an entry
    pub line_done: bool,

    /// The budget is met; stop reading
    pub close: bool,

    /// The completed entry was filtered out and must not be mirrored
    pub no_flush: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregatorState {
    AwaitingBoundary,
    AccumulatingFrames,
    Done,
}

#[derive(Clone, Debug)]
enum Pending {
    Frame(StackFrame),
    Text(String),
}

impl Pending {
    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if is_blank(text))
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Reassembles entries until a budget of kept entries is met
pub struct EntryAggregator {
    filter: EntryFilter,
    remaining: usize,
    state: AggregatorState,
    pending: Vec<Pending>,

    /// Offset of the earliest pending line
    pending_offset: u64,

    entries: Vec<LogEntry>,
    earliest_sealed: Option<u64>,
    discarded: usize,
}

impl EntryAggregator {
    pub fn new(max_entries: usize, filter: EntryFilter) -> Self {
        Self {
            filter,
            remaining: max_entries,
            state: if max_entries == 0 {
                AggregatorState::Done
            } else {
                AggregatorState::AwaitingBoundary
            },
            pending: Vec::new(),
            pending_offset: 0,
            entries: Vec::new(),
            earliest_sealed: None,
            discarded: 0,
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == AggregatorState::Done
    }

    /// Entries kept so far, most recent first
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }

    /// Offset of the first line of the earliest sealed entry, kept or not
    pub fn earliest_sealed(&self) -> Option<u64> {
        self.earliest_sealed
    }

    /// Number of sealed entries dropped by the filter
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Feed the next line of the backward scan
    pub fn feed(&mut self, line: ParsedLine, offset: u64) -> LineControl {
        if self.is_done() {
            return LineControl {
                close: true,
                ..LineControl::default()
            };
        }

        match line {
            ParsedLine::StackFrame(frame) => {
                self.push_pending(Pending::Frame(frame), offset);
                LineControl::default()
            }
            ParsedLine::Continuation(text) => {
                self.push_pending(Pending::Text(text), offset);
                LineControl::default()
            }
            ParsedLine::ContextBlock { id, payload } => {
                // Context blocks do not consume budget and leave pending lines alone
                self.entries.push(LogEntry::context(&id, payload, offset));
                LineControl {
                    line_done: true,
                    ..LineControl::default()
                }
            }
            ParsedLine::EntryStart(start) => self.seal(LogEntry::from_start(start, offset)),
        }
    }

    /// Seal leftover lines at the start of the file as a header-less entry
    pub fn finish(&mut self) -> LineControl {
        if self.is_done() || self.pending.is_empty() {
            return LineControl::default();
        }
        if self.pending.iter().all(Pending::is_blank) {
            self.pending.clear();
            return LineControl::default();
        }
        let entry = LogEntry {
            offset: self.pending_offset,
            ..LogEntry::default()
        };
        self.seal(entry)
    }

    fn push_pending(&mut self, item: Pending, offset: u64) {
        self.pending.push(item);
        self.pending_offset = offset;
        self.state = AggregatorState::AccumulatingFrames;
    }

    fn seal(&mut self, mut entry: LogEntry) -> LineControl {
        let pending = mem::take(&mut self.pending);
        entry.raw_lines += pending.len();

        // Back into written order: the first pending item is the last line
        let mut extra = Vec::new();
        for item in pending.into_iter().rev() {
            match item {
                Pending::Frame(frame) => entry.sub_items.push(frame),
                Pending::Text(text) => extra.push(text),
            }
        }
        // Blank lines survive only between non-blank ones
        let first = extra.iter().position(|t| !is_blank(t));
        let last = extra.iter().rposition(|t| !is_blank(t));
        if let (Some(first), Some(last)) = (first, last) {
            if !entry.message.is_empty() {
                entry.message.push('\n');
            }
            entry.message.push_str(&extra[first..=last].join("\n"));
        }

        self.earliest_sealed = Some(entry.offset);
        self.state = AggregatorState::AwaitingBoundary;

        if !self.filter.matches(&entry) {
            self.discarded += 1;
            return LineControl {
                line_done: true,
                no_flush: true,
                close: false,
            };
        }

        self.entries.push(entry);
        self.remaining = self.remaining.saturating_sub(1);

        let close = self.remaining == 0;
        if close {
            self.state = AggregatorState::Done;
        }
        LineControl {
            line_done: true,
            close,
            no_flush: false,
        }
    }
}
