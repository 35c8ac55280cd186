// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use crate::EntryType;
use crate::options::AccessMode;
use crate::reader::ReaderError;

pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur in archive filesystem operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Archive already open: {}", .0.display())]
    AlreadyOpen(PathBuf),

    #[error("Archive not open: {}", .0.display())]
    NotOpen(PathBuf),

    #[error("Archive filesystem closed: {}", .0.display())]
    Closed(PathBuf),

    #[error("No such entry: {0}")]
    NotFound(String),

    #[error("Not a directory: {path} (is {actual})")]
    NotADirectory { path: String, actual: EntryType },

    #[error("Not a file: {path} (is {actual})")]
    NotAFile { path: String, actual: EntryType },

    #[error("Not a symlink: {path} (is {actual})")]
    NotASymlink { path: String, actual: EntryType },

    #[error("Access denied: {path} ({modes:?})")]
    AccessDenied { path: String, modes: Vec<AccessMode> },

    #[error("Read-only filesystem: {0}")]
    ReadOnlyFilesystem(&'static str),

    #[error("Failed to read archive {}: {source}", .archive.display())]
    ArchiveRead {
        archive: PathBuf,
        #[source]
        source: ReaderError,
    },

    #[error("Unsupported attribute view: {0}")]
    UnsupportedView(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn already_open<P: AsRef<Path>>(archive: P) -> Self {
        Error::AlreadyOpen(archive.as_ref().to_path_buf())
    }

    pub fn not_open<P: AsRef<Path>>(archive: P) -> Self {
        Error::NotOpen(archive.as_ref().to_path_buf())
    }

    pub fn closed<P: AsRef<Path>>(archive: P) -> Self {
        Error::Closed(archive.as_ref().to_path_buf())
    }

    pub fn not_found<S: AsRef<str>>(path: S) -> Self {
        Error::NotFound(path.as_ref().to_string())
    }

    pub fn not_a_directory<S: AsRef<str>>(path: S, actual: EntryType) -> Self {
        Error::NotADirectory {
            path: path.as_ref().to_string(),
            actual,
        }
    }

    pub fn not_a_file<S: AsRef<str>>(path: S, actual: EntryType) -> Self {
        Error::NotAFile {
            path: path.as_ref().to_string(),
            actual,
        }
    }

    pub fn not_a_symlink<S: AsRef<str>>(path: S, actual: EntryType) -> Self {
        Error::NotASymlink {
            path: path.as_ref().to_string(),
            actual,
        }
    }

    pub fn access_denied<S: AsRef<str>>(path: S, modes: &[AccessMode]) -> Self {
        Error::AccessDenied {
            path: path.as_ref().to_string(),
            modes: modes.to_vec(),
        }
    }

    /// Every mutating entry point funnels through here
    pub fn read_only(operation: &'static str) -> Self {
        Error::ReadOnlyFilesystem(operation)
    }

    pub fn archive_read<P: AsRef<Path>>(archive: P, source: ReaderError) -> Self {
        Error::ArchiveRead {
            archive: archive.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn unsupported_view<S: Into<String>>(view: S) -> Self {
        Error::UnsupportedView(view.into())
    }

    pub fn unsupported_operation<S: Into<String>>(what: S) -> Self {
        Error::UnsupportedOperation(what.into())
    }

    pub fn invalid_uri<S: Into<String>>(what: S) -> Self {
        Error::InvalidUri(what.into())
    }
}
