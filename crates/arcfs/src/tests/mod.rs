// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0


use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::content::MemoryContent;
use crate::entry::Entry;
use crate::provider::ArchiveFileSystemProvider;
use crate::reader::MemoryReader;
use crate::registry::FileSystemRegistry;

pub(crate) fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

pub(crate) fn file(path: &str, content: &str) -> Entry {
    Entry::file(
        path,
        content.len() as u64,
        epoch(),
        MemoryContent::new_handle(content),
    )
}

pub(crate) fn dir(path: &str) -> Entry {
    Entry::directory(path, epoch())
}

pub(crate) fn symlink(path: &str, target: &str) -> Entry {
    Entry::symlink(path, target, epoch())
}

/// A provider over a shared in-memory reader
pub(crate) fn memory_provider(
    reader: MemoryReader,
) -> (ArchiveFileSystemProvider, Arc<MemoryReader>) {
    let reader = Arc::new(reader);
    let registry = Arc::new(FileSystemRegistry::new(reader.clone()));
    (ArchiveFileSystemProvider::new(registry), reader)
}
