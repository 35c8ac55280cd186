// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::EntryType;
use crate::archive_path::ArchivePath;
use crate::error::{Error, Result};
use crate::fs::ArchiveFileSystem;
use crate::node::NodeID;

/// Attribute namespaces a caller may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeViewKind {
    Basic,
    Posix,
    Dos,
    Owner,
    Acl,
    User,
}

impl AttributeViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeViewKind::Basic => "basic",
            AttributeViewKind::Posix => "posix",
            AttributeViewKind::Dos => "dos",
            AttributeViewKind::Owner => "owner",
            AttributeViewKind::Acl => "acl",
            AttributeViewKind::User => "user",
        }
    }

    /// Archives only carry the basic attribute set
    #[must_use]
    pub fn is_supported(&self) -> bool {
        *self == AttributeViewKind::Basic
    }
}

impl std::fmt::Display for AttributeViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AttributeViewKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(AttributeViewKind::Basic),
            "posix" => Ok(AttributeViewKind::Posix),
            "dos" => Ok(AttributeViewKind::Dos),
            "owner" => Ok(AttributeViewKind::Owner),
            "acl" => Ok(AttributeViewKind::Acl),
            "user" => Ok(AttributeViewKind::User),
            other => Err(Error::unsupported_view(other)),
        }
    }
}

/// Basic attributes of an archive entry.
///
/// Archives record a single timestamp; access and creation times repeat it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicAttributes {
    pub entry_type: EntryType,
    pub size: u64,
    pub last_modified_time: DateTime<Utc>,
    pub last_access_time: DateTime<Utc>,
    pub creation_time: DateTime<Utc>,
    /// Unique across archives: the archive file plus the entry path
    pub file_key: String,
}

impl BasicAttributes {
    pub(crate) fn from_node(fs: &ArchiveFileSystem, id: NodeID) -> Self {
        let node = fs.tree().node(id);
        let time = node.last_modified();
        Self {
            entry_type: node.entry_type(),
            size: node.size(),
            last_modified_time: time,
            last_access_time: time,
            creation_time: time,
            file_key: format!("{}#/{}", fs.archive_file().display(), fs.path_of(id)),
        }
    }

    pub fn is_regular_file(&self) -> bool {
        self.entry_type.is_file()
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type.is_directory()
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.entry_type.is_symlink()
    }

    /// Never true: every node is a file, a directory or a symlink
    pub fn is_other(&self) -> bool {
        false
    }
}

/// The `basic` attribute view of one archive path
#[derive(Debug, Clone)]
pub struct ArchiveAttributeView {
    path: ArchivePath,
}

impl ArchiveAttributeView {
    pub(crate) fn new(path: ArchivePath) -> Self {
        Self { path }
    }

    pub fn name(&self) -> &'static str {
        AttributeViewKind::Basic.as_str()
    }

    pub fn read_attributes(&self) -> Result<BasicAttributes> {
        self.path.file_system().get_entry(self.path.as_str())
    }

    pub fn set_times(
        &self,
        _last_modified: Option<DateTime<Utc>>,
        _last_access: Option<DateTime<Utc>>,
        _creation: Option<DateTime<Utc>>,
    ) -> Result<()> {
        Err(Error::read_only("set times"))
    }
}
