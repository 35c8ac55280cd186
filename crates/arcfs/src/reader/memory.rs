// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{ArchiveReader, ReaderError};
use crate::entry::Entry;

/// Serves canned entry lists keyed by archive path.
///
/// Used to embed archives that are already in memory, and by tests that need
/// control over scan timing and failures.
#[derive(Debug, Default)]
pub struct MemoryReader {
    archives: HashMap<PathBuf, Vec<Entry>>,
    failing: HashSet<PathBuf>,
    serialized_streams: bool,
    scan_delay: Option<Duration>,
    scans: AtomicUsize,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_archive<P: Into<PathBuf>>(mut self, archive_file: P, entries: Vec<Entry>) -> Self {
        _ = self.archives.insert(archive_file.into(), entries);
        self
    }

    /// Scans of this archive fail with a corrupt-archive error
    pub fn with_failing_archive<P: Into<PathBuf>>(mut self, archive_file: P) -> Self {
        _ = self.failing.insert(archive_file.into());
        self
    }

    /// Report that content accessors cannot be opened concurrently
    pub fn with_serialized_streams(mut self) -> Self {
        self.serialized_streams = true;
        self
    }

    /// Every scan sleeps this long before returning
    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = Some(delay);
        self
    }

    /// Number of scans started so far, failed ones included
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveReader for MemoryReader {
    async fn read_entries(&self, archive_file: &Path) -> Result<Vec<Entry>, ReaderError> {
        _ = self.scans.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.scan_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(archive_file) {
            return Err(ReaderError::Corrupt(format!(
                "{} is unreadable",
                archive_file.display()
            )));
        }

        self.archives.get(archive_file).cloned().ok_or_else(|| {
            ReaderError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no archive at {}", archive_file.display()),
            ))
        })
    }

    fn supports_concurrent_streams(&self) -> bool {
        !self.serialized_streams
    }
}
