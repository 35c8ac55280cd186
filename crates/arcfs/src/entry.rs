// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};

use crate::EntryType;
use crate::content::Handle;

/// One record of an archive's flat entry stream, as produced by an
/// [`ArchiveReader`](crate::reader::ArchiveReader) scan.
#[derive(Clone, Debug)]
pub struct Entry {
    /// Archive-internal path, `/` separated, no leading slash
    pub path: String,

    pub entry_type: EntryType,

    /// Uncompressed size in bytes (0 for directories)
    pub size: u64,

    pub last_modified: DateTime<Utc>,

    /// Present iff `entry_type` is `Symlink`
    pub symlink_target: Option<String>,

    /// Present for regular files; valid while the archive filesystem is open
    pub content: Option<Handle>,
}

impl Entry {
    pub fn file<S: Into<String>>(
        path: S,
        size: u64,
        last_modified: DateTime<Utc>,
        content: Handle,
    ) -> Self {
        Self {
            path: path.into(),
            entry_type: EntryType::File,
            size,
            last_modified,
            symlink_target: None,
            content: Some(content),
        }
    }

    pub fn directory<S: Into<String>>(path: S, last_modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            entry_type: EntryType::Directory,
            size: 0,
            last_modified,
            symlink_target: None,
            content: None,
        }
    }

    /// The size of a symlink is the length of its stored target
    pub fn symlink<S: Into<String>, T: Into<String>>(
        path: S,
        target: T,
        last_modified: DateTime<Utc>,
    ) -> Self {
        let target = target.into();
        Self {
            path: path.into(),
            entry_type: EntryType::Symlink,
            size: target.len() as u64,
            last_modified,
            symlink_target: Some(target),
            content: None,
        }
    }
}
