//! Shrinking a log down to its most recent entries.

use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::info;

use crate::cache::ExpiringCache;
use crate::engine::{LogReader, ReadRequest};
use crate::error::{LogError, ReadError};

impl<C: ExpiringCache> LogReader<C> {
    /// Drop everything before the last `keep_last` entries, in place
    ///
    /// Returns the new file size. Cached bookkeeping for the file is
    /// invalidated.
    pub fn truncate(&self, path: impl AsRef<Path>, keep_last: usize) -> Result<u64, LogError> {
        let path = path.as_ref();
        let truncate_err = |source: io::Error| LogError::Truncate {
            path: path.to_path_buf(),
            source,
        };

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| ReadError::from_open(path, err))?;
        let len = file.metadata().map_err(truncate_err)?.len();

        let cut = if keep_last == 0 {
            Some(len)
        } else {
            let request = ReadRequest::new(keep_last);
            self.read_page(path, &request, None)?.resume_offset
        };

        let new_len = match cut {
            Some(cut) if cut > 0 => {
                shift_to_start(&mut file, cut, len, self.config().chunk_size).map_err(truncate_err)?;
                let new_len = len - cut;
                file.set_len(new_len).map_err(truncate_err)?;
                file.sync_all().map_err(truncate_err)?;
                new_len
            }
            _ => len,
        };

        self.forget(path);
        info!(path = %path.display(), old_len = len, new_len, "log truncated");
        Ok(new_len)
    }
}

/// Move bytes `[from, len)` to the start of the file
fn shift_to_start<F: Read + Write + Seek>(
    file: &mut F,
    from: u64,
    len: u64,
    chunk_size: usize,
) -> io::Result<()> {
    let mut buf = vec![0u8; chunk_size.max(4096)];
    let mut read_pos = from;
    let mut write_pos = 0u64;

    while read_pos < len {
        let want = buf.len().min((len - read_pos) as usize);
        file.seek(SeekFrom::Start(read_pos))?;
        file.read_exact(&mut buf[..want])?;
        file.seek(SeekFrom::Start(write_pos))?;
        file.write_all(&buf[..want])?;
        read_pos += want as u64;
        write_pos += want as u64;
    }
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::engine::ReaderConfig;
    use crate::parser::ParserConfig;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;
    use std::fs;
    use std::io::Cursor;

    fn reader() -> LogReader {
        LogReader::new(
            ReaderConfig {
                chunk_size: 32,
                parser: ParserConfig {
                    verify_source_files: false,
                    ..ParserConfig::default()
                },
                ..ReaderConfig::default()
            },
            MemoryCache::new(),
        )
    }

    fn log_with(count: u32) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let content: String = (0..count)
            .map(|i| {
                format!(
                    "[16-Oct-2026 10:00:{i:02} UTC] PHP Warning:  entry {i}\n#0 /var/www/a.php({i}): f()\n"
                )
            })
            .collect();
        fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_keep_last_entries() {
        let file = log_with(6);
        let reader = reader();

        let new_len = reader.truncate(file.path(), 2).unwrap();
        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(content.len() as u64, new_len);
        assert!(content.starts_with("[16-Oct-2026 10:00:04 UTC] PHP Warning:  entry 4\n"));
        assert!(content.ends_with("#0 /var/www/a.php(5): f()\n"));

        let entries = reader
            .read_last_entries(file.path(), 10, &HashSet::new(), false)
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].offset, 0);
    }

    #[test]
    fn test_keep_zero_empties_file() {
        let file = log_with(3);
        assert_eq!(reader().truncate(file.path(), 0).unwrap(), 0);
        assert_eq!(fs::metadata(file.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_keep_more_than_present_is_noop() {
        let file = log_with(3);
        let before = fs::read(file.path()).unwrap();
        let new_len = reader().truncate(file.path(), 10).unwrap();
        assert_eq!(new_len, before.len() as u64);
        assert_eq!(fs::read(file.path()).unwrap(), before);
    }

    #[test]
    fn test_truncate_forgets_cached_marks() {
        let file = log_with(3);
        let reader = reader();
        reader.mark_seen(file.path(), Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap());
        reader.truncate(file.path(), 1).unwrap();
        assert_eq!(reader.last_seen(file.path()), None);
    }

    #[test]
    fn test_missing_file() {
        let err = reader().truncate("/no/such/php.log", 1).unwrap_err();
        assert!(matches!(err, LogError::Read(ReadError::FileNotFound(_))));
    }

    #[test]
    fn test_shift_to_start() {
        let mut cursor = Cursor::new(b"0123456789".to_vec());
        shift_to_start(&mut cursor, 6, 10, 3).unwrap();
        assert_eq!(&cursor.get_ref()[..4], b"6789");
    }
}
