// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Maps each archive file to its single live filesystem.

use diagnostics::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::fs::ArchiveFileSystem;
use crate::reader::{ArchiveFormatReader, ArchiveReader, ReaderConfig, ReaderError};

enum Slot {
    /// A tree is being built for this archive
    Opening,
    Open(Arc<ArchiveFileSystem>),
}

/// Shared between the registry and the filesystems it created, so that a
/// filesystem can deregister itself on close.
#[derive(Default)]
pub(crate) struct RegistryState {
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl RegistryState {
    /// No critical section awaits, so poisoning can only follow a panic in
    /// map code; the map itself stays consistent.
    fn slots(&self) -> MutexGuard<'_, HashMap<PathBuf, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the slot only if it still holds this very instance
    pub(crate) fn remove_if_matches(&self, key: &Path, fs: &ArchiveFileSystem) -> bool {
        let mut slots = self.slots();
        let matches = matches!(
            slots.get(key),
            Some(Slot::Open(stored)) if std::ptr::eq(Arc::as_ptr(stored), fs)
        );
        if matches {
            _ = slots.remove(key);
        }
        matches
    }
}

/// Releases an `Opening` slot unless the build published a filesystem.
/// Covers failed builds and `open` futures dropped mid-build.
struct Reservation<'a> {
    state: &'a RegistryState,
    key: PathBuf,
    published: bool,
}

impl Reservation<'_> {
    fn publish(mut self, fs: Arc<ArchiveFileSystem>) {
        _ = self.state.slots().insert(self.key.clone(), Slot::Open(fs));
        self.published = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        let mut slots = self.state.slots();
        if matches!(slots.get(&self.key), Some(Slot::Opening)) {
            _ = slots.remove(&self.key);
        }
    }
}

/// Process-wide table of open archive filesystems.
///
/// Construct one at startup and hand it to whoever opens archives; there is
/// no global instance.
pub struct FileSystemRegistry {
    reader: Arc<dyn ArchiveReader>,
    state: Arc<RegistryState>,
}

impl Default for FileSystemRegistry {
    fn default() -> Self {
        Self::new(Arc::new(ArchiveFormatReader::default()))
    }
}

impl FileSystemRegistry {
    pub fn new(reader: Arc<dyn ArchiveReader>) -> Self {
        Self {
            reader,
            state: Arc::new(RegistryState::default()),
        }
    }

    /// A registry over the format-detecting reader with custom limits
    pub fn with_config(config: ReaderConfig) -> std::result::Result<Self, ReaderError> {
        let reader = ArchiveFormatReader::new(config)?;
        Ok(Self::new(Arc::new(reader)))
    }

    /// The key identifying an archive file
    async fn key_for(archive_file: &Path) -> PathBuf {
        tokio::fs::canonicalize(archive_file)
            .await
            .unwrap_or_else(|_| archive_file.to_path_buf())
    }

    /// Scans the archive and registers a new filesystem for it.
    ///
    /// Fails with `AlreadyOpen` while another filesystem for the same file is
    /// live or being built. The scan runs without holding the lock.
    pub async fn open(&self, archive_file: &Path) -> Result<Arc<ArchiveFileSystem>> {
        let key = Self::key_for(archive_file).await;
        let archive = key.display().to_string();

        let reservation = {
            let mut slots = self.state.slots();
            let busy = match slots.get(&key) {
                Some(Slot::Opening) => true,
                Some(Slot::Open(fs)) => fs.is_open(),
                None => false,
            };
            if busy {
                log_debug!("Archive {archive} is already open", archive: archive);
                return Err(Error::already_open(&key));
            }
            _ = slots.insert(key.clone(), Slot::Opening);
            Reservation {
                state: &self.state,
                key: key.clone(),
                published: false,
            }
        };

        log_debug!("Scanning archive {archive}", archive: archive);
        let entries = match self.reader.read_entries(&key).await {
            Ok(entries) => entries,
            Err(e) => {
                let reason = e.to_string();
                log_warn!(
                    "Failed to read archive {archive}: {reason}",
                    archive: archive,
                    reason: reason
                );
                return Err(Error::archive_read(&key, e));
            }
        };

        let fs = Arc::new(ArchiveFileSystem::new(
            key,
            entries,
            self.reader.supports_concurrent_streams(),
            Arc::downgrade(&self.state),
        ));
        reservation.publish(fs.clone());
        log_info!("Opened archive filesystem {archive}", archive: archive);
        Ok(fs)
    }

    /// The live filesystem for `archive_file`
    pub async fn get(&self, archive_file: &Path) -> Result<Arc<ArchiveFileSystem>> {
        let key = Self::key_for(archive_file).await;
        match self.state.slots().get(&key) {
            Some(Slot::Open(fs)) if fs.is_open() => Ok(fs.clone()),
            _ => Err(Error::not_open(&key)),
        }
    }

    /// Closes `fs` and deregisters it if this registry still maps its
    /// archive file to that instance. Returns whether an entry was removed.
    pub fn close(&self, fs: &ArchiveFileSystem) -> bool {
        _ = fs.mark_closed();
        let removed = self.state.remove_if_matches(fs.archive_file(), fs);
        let archive = fs.archive_file().display().to_string();
        if removed {
            log_info!("Closed archive filesystem {archive}", archive: archive);
        } else {
            log_debug!("Stale close of {archive} ignored", archive: archive);
        }
        removed
    }

    /// Number of live filesystems
    pub fn len(&self) -> usize {
        self.state
            .slots()
            .values()
            .filter(|slot| matches!(slot, Slot::Open(fs) if fs.is_open()))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every live filesystem. Builds in flight are left alone.
    pub fn shutdown(&self) -> usize {
        let closed: Vec<Arc<ArchiveFileSystem>> = {
            let mut slots = self.state.slots();
            let keys: Vec<PathBuf> = slots
                .iter()
                .filter(|(_, slot)| matches!(slot, Slot::Open(_)))
                .map(|(key, _)| key.clone())
                .collect();
            keys.iter()
                .filter_map(|key| match slots.remove(key) {
                    Some(Slot::Open(fs)) => Some(fs),
                    _ => None,
                })
                .collect()
        };

        let count = closed.iter().filter(|fs| fs.mark_closed()).count();
        log_info!("Registry shut down, closed {count} filesystems", count: count);
        count
    }
}
