//! Backward line iteration over a file.
//!
//! The reader walks a file from a starting offset toward its beginning in
//! fixed-size chunks. A fragment at the front of a chunk is carried over and
//! completed by the next (earlier) chunk, so lines are never cut at a seam.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ReadError, Result};

/// Default chunk size (8KB)
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A physical line found during a backward scan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLine {
    /// Line content without the newline (and without a trailing `\r`)
    pub text: String,

    /// Byte offset of the first byte of the line
    pub offset: u64,
}

/// Lazy, finite iterator over the lines of a file, last line first
pub struct ReverseLineReader {
    file: File,
    path: PathBuf,
    chunk_size: usize,

    /// Bytes before this offset have not been read yet
    position: u64,

    /// End of the scanned range
    end: u64,

    /// Unfinished line starting at `position`, as chunk fragments latest first
    carry: Vec<Vec<u8>>,
    has_carry: bool,

    /// Complete lines of the current chunk, earliest first
    ready: Vec<(Vec<u8>, u64)>,

    resume_offset: u64,
    chunks_read: u64,
    failed: bool,
}

impl ReverseLineReader {
    /// Open `path` for a backward scan ending at `start_offset` (or at EOF)
    pub fn open(path: impl AsRef<Path>, chunk_size: usize, start_offset: Option<u64>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| ReadError::from_open(path, e))?;
        if !metadata.is_file() {
            return Err(ReadError::FileNotReadable {
                path: path.to_path_buf(),
                source: io::Error::other("not a regular file"),
            });
        }

        let file = File::open(path).map_err(|e| ReadError::from_open(path, e))?;
        let end = start_offset.map_or(metadata.len(), |offset| offset.min(metadata.len()));

        Ok(Self {
            file,
            path: path.to_path_buf(),
            chunk_size: chunk_size.max(1),
            position: end,
            end,
            carry: Vec::new(),
            has_carry: false,
            ready: Vec::new(),
            resume_offset: end,
            chunks_read: 0,
            failed: false,
        })
    }

    /// Offset of the earliest line yielded so far
    ///
    /// Opening a new reader with this offset continues the scan with the
    /// line before it.
    pub fn resume_offset(&self) -> u64 {
        self.resume_offset
    }

    /// Whether every line of the range has been yielded
    pub fn at_start(&self) -> bool {
        self.position == 0 && !self.has_carry && self.ready.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Read the chunk ending at `position` and split it into lines
    ///
    /// Only the fresh bytes are scanned. A line longer than a chunk is kept
    /// as fragments and joined once, when its first byte is reached.
    fn read_chunk(&mut self) -> io::Result<()> {
        // Truncated or replaced underneath us
        if self.file.metadata()?.len() < self.position {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "file shrank below read position",
            ));
        }

        let start = self.position.saturating_sub(self.chunk_size as u64);
        let len = (self.position - start) as usize;

        let mut buf = vec![0u8; len];
        self.file.seek(SeekFrom::Start(start))?;
        self.file.read_exact(&mut buf)?;
        self.position = start;
        self.chunks_read += 1;

        let newlines: Vec<usize> = buf
            .iter()
            .enumerate()
            .filter_map(|(i, byte)| (*byte == b'\n').then_some(i))
            .collect();

        let Some((&first_nl, &last_nl)) = newlines.first().zip(newlines.last()) else {
            // Still inside one line
            self.carry.push(buf);
            self.has_carry = true;
            return Ok(());
        };

        for pair in newlines.windows(2) {
            let (from, to) = (pair[0] + 1, pair[1]);
            self.ready.push((buf[from..to].to_vec(), start + from as u64));
        }

        let tail_offset = start + last_nl as u64 + 1;
        let tail = self.take_carry(&buf[last_nl + 1..]);
        if !(tail.is_empty() && tail_offset == self.end) {
            self.ready.push((tail, tail_offset));
        }

        buf.truncate(first_nl);
        self.carry.push(buf);
        self.has_carry = true;

        Ok(())
    }

    /// Complete the carried line with the bytes that precede it
    fn take_carry(&mut self, head: &[u8]) -> Vec<u8> {
        let fragments = mem::take(&mut self.carry);
        self.has_carry = false;

        let total = head.len() + fragments.iter().map(Vec::len).sum::<usize>();
        let mut line = Vec::with_capacity(total);
        line.extend_from_slice(head);
        for fragment in fragments.iter().rev() {
            line.extend_from_slice(fragment);
        }
        line
    }

    fn emit(&mut self, mut bytes: Vec<u8>, offset: u64) -> RawLine {
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        self.resume_offset = offset;
        RawLine {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            offset,
        }
    }
}

impl Iterator for ReverseLineReader {
    type Item = Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }

            if let Some((bytes, offset)) = self.ready.pop() {
                return Some(Ok(self.emit(bytes, offset)));
            }

            if self.position == 0 {
                if self.has_carry {
                    let bytes = self.take_carry(&[]);
                    return Some(Ok(self.emit(bytes, 0)));
                }
                debug!(path = %self.path.display(), chunks = self.chunks_read, "reached start of file");
                return None;
            }

            if let Err(err) = self.read_chunk() {
                self.failed = true;
                warn!(
                    path = %self.path.display(),
                    position = self.position,
                    error = %err,
                    "log file changed during backward read"
                );
                return Some(Err(ReadError::FileVanishedDuringRead(self.path.clone())));
            }
        }
    }
}
