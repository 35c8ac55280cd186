// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Read-only filesystem view over the contents of zip and tar archives.
//!
//! An archive's flat entry list is scanned once into an immutable tree with
//! implied directories filled in. A [`FileSystemRegistry`] keeps at most one
//! live [`ArchiveFileSystem`] per archive file, and the
//! [`ArchiveFileSystemProvider`] exposes them behind `archive:` URIs.

mod archive_path;
mod attributes;
mod content;
mod dir;
mod entry;
mod entry_type;
mod error;
mod file_store;
mod fs;
mod node;
mod options;
mod provider;
mod registry;
mod tree;
mod uri;

pub mod path;
pub mod reader;

pub use archive_path::ArchivePath;
pub use attributes::{ArchiveAttributeView, AttributeViewKind, BasicAttributes};
pub use content::{ContentAccessor, EntryReader, Handle, MemoryContent};
pub use dir::{DirectoryFilter, DirectoryStream};
pub use entry::Entry;
pub use entry_type::EntryType;
pub use error::{Error, Result};
pub use file_store::ArchiveFileStore;
pub use fs::ArchiveFileSystem;
pub use node::{Node, NodeID, ROOT_ID};
pub use options::{AccessMode, OpenOption, validate_read_only};
pub use provider::ArchiveFileSystemProvider;
pub use registry::FileSystemRegistry;
pub use tree::{FsStats, Tree};
pub use uri::{ArchiveUri, SCHEME};

#[cfg(test)]
mod tests;
