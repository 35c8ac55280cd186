// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use url::Url;

use crate::error::Result;
use crate::fs::ArchiveFileSystem;
use crate::path;
use crate::uri::ArchiveUri;

/// A normalized path bound to the archive filesystem it belongs to.
///
/// Two paths are equal when they name the same entry of the same
/// filesystem instance.
#[derive(Clone)]
pub struct ArchivePath {
    fs: Arc<ArchiveFileSystem>,
    path: String,
}

impl ArchivePath {
    pub(crate) fn new(fs: Arc<ArchiveFileSystem>, path: &str) -> Self {
        Self {
            fs,
            path: path::normalize(path),
        }
    }

    pub fn file_system(&self) -> &Arc<ArchiveFileSystem> {
        &self.fs
    }

    /// Normalized, without a leading slash
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn file_name(&self) -> Option<&str> {
        path::basename(&self.path)
    }

    pub fn parent(&self) -> Option<ArchivePath> {
        path::dirname(&self.path).map(|parent| ArchivePath {
            fs: self.fs.clone(),
            path: parent,
        })
    }

    /// Resolves `other` against this path; a leading `/` makes it absolute
    pub fn join(&self, other: &str) -> ArchivePath {
        if other.starts_with(path::SEPARATOR) {
            ArchivePath::new(self.fs.clone(), other)
        } else {
            ArchivePath::new(self.fs.clone(), &path::join(&self.path, other))
        }
    }

    pub fn segments(&self) -> Vec<&str> {
        path::segments(&self.path)
    }

    #[must_use]
    pub fn same_file_system(&self, other: &ArchivePath) -> bool {
        Arc::ptr_eq(&self.fs, &other.fs)
    }

    pub fn to_uri(&self) -> Result<Url> {
        ArchiveUri::new(self.fs.archive_file(), &self.path).to_url()
    }
}

impl PartialEq for ArchivePath {
    fn eq(&self, other: &Self) -> bool {
        self.same_file_system(other) && self.path == other.path
    }
}

impl Eq for ArchivePath {}

impl std::fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.path)
    }
}

impl std::fmt::Debug for ArchivePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#/{}", self.fs.archive_file().display(), self.path)
    }
}
