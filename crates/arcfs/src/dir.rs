// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::archive_path::ArchivePath;
use crate::error::{Error, Result};
use crate::fs::ArchiveFileSystem;
use crate::node::NodeID;
use crate::path;

/// Caller-supplied predicate deciding which children a stream yields
pub type DirectoryFilter = Box<dyn FnMut(&ArchivePath) -> bool + Send>;

/// The children of one directory, yielded lazily in archive order.
///
/// Single pass: iterating consumes the stream. Iteration stops early if the
/// filesystem is closed underneath it.
pub struct DirectoryStream {
    fs: Arc<ArchiveFileSystem>,
    dir: NodeID,
    next: usize,
    filter: DirectoryFilter,
}

impl DirectoryStream {
    pub(crate) fn open(
        fs: Arc<ArchiveFileSystem>,
        dir: &str,
        filter: DirectoryFilter,
    ) -> Result<Self> {
        let id = fs.resolve(dir)?;
        let kind = fs.tree().node(id).entry_type();
        if !kind.is_directory() {
            return Err(Error::not_a_directory(path::normalize(dir), kind));
        }
        Ok(Self {
            fs,
            dir: id,
            next: 0,
            filter,
        })
    }

    /// A stream that yields every child
    pub fn accept_all() -> DirectoryFilter {
        Box::new(|_| true)
    }
}

impl Iterator for DirectoryStream {
    type Item = ArchivePath;

    fn next(&mut self) -> Option<ArchivePath> {
        if !self.fs.is_open() {
            return None;
        }
        let children = self.fs.tree().node(self.dir).children();
        while let Some(child) = children.get(self.next) {
            self.next += 1;
            let candidate = self.fs.get_path(&self.fs.path_of(*child));
            if (self.filter)(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

impl std::fmt::Debug for DirectoryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryStream")
            .field("dir", &self.fs.path_of(self.dir))
            .field("next", &self.next)
            .finish()
    }
}
