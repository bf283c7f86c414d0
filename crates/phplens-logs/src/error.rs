use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures that abort a read request
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("log file does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("log file is not readable: {}: {source}", .path.display())]
    FileNotReadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("log file vanished during read: {}", .0.display())]
    FileVanishedDuringRead(PathBuf),
}

impl ReadError {
    /// Map an error from opening or inspecting the file
    pub(crate) fn from_open(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(path.to_path_buf()),
            _ => Self::FileNotReadable {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Failures of maintenance operations on a log file
#[derive(Error, Debug)]
pub enum LogError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("failed to truncate {}: {source}", .path.display())]
    Truncate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, ReadError>;
