// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Archive readers -- the byte-level side of the archive filesystem
//!
//! A reader performs one full scan of an archive file and returns its flat
//! entry list. Regular file entries carry a content accessor that reopens
//! the archive on demand, so every stream is independent of the others.
//!
//! - `format`: archive format detection via magic bytes and extensions
//! - `zip`: ZIP archives
//! - `tar`: TAR archives, plain, gzip or zstd compressed
//! - `memory`: canned entries, for embedding and tests

mod format;
mod memory;
mod tar;
mod zip;

pub use format::{ArchiveFormat, FormatDetector};
pub use memory::MemoryReader;
pub use tar::TarReader;
pub use zip::ZipReader;

use async_trait::async_trait;
use diagnostics::*;
use std::io::Read;
use std::path::Path;

use crate::entry::Entry;

/// Failure inside an archive reader
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] ::zip::result::ZipError),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    #[error("Archive contains more than {0} entries")]
    TooManyEntries(usize),

    #[error("Entry '{name}' holds more than the {limit} byte limit ({size} bytes declared)")]
    EntryTooLarge { name: String, size: u64, limit: u64 },

    #[error("Invalid reader configuration: {0}")]
    InvalidConfig(String),
}

/// Limits applied to archive scans and content reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Maximum number of entries one scan may produce
    pub max_entries: usize,
    /// Maximum bytes held in memory for one entry: decoded content of zip
    /// records and compressed tar members, and symlink targets
    pub max_entry_size: u64,
}

const DEFAULT_MAX_ENTRY_SIZE: u64 = 256 * 1024 * 1024;

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000_000,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}

impl ReaderConfig {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }

    pub fn validate(&self) -> Result<(), ReaderError> {
        if self.max_entries == 0 {
            return Err(ReaderError::InvalidConfig(
                "max_entries must be greater than 0".to_string(),
            ));
        }
        if self.max_entry_size == 0 {
            return Err(ReaderError::InvalidConfig(
                "max_entry_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn check_count(&self, count: usize) -> Result<(), ReaderError> {
        if count > self.max_entries {
            return Err(ReaderError::TooManyEntries(self.max_entries));
        }
        Ok(())
    }

    /// Reads one entry fully into memory. The declared size is checked
    /// before anything is allocated; the bytes read are capped as well.
    pub(crate) fn read_entry<R: Read>(
        &self,
        name: &str,
        declared: u64,
        reader: R,
    ) -> Result<Vec<u8>, ReaderError> {
        let too_large = |size| ReaderError::EntryTooLarge {
            name: name.to_string(),
            size,
            limit: self.max_entry_size,
        };
        if declared > self.max_entry_size {
            return Err(too_large(declared));
        }

        let mut content = Vec::new();
        _ = reader
            .take(self.max_entry_size.saturating_add(1))
            .read_to_end(&mut content)?;
        if content.len() as u64 > self.max_entry_size {
            return Err(too_large(declared));
        }
        Ok(content)
    }
}

/// Produces the entry list of an archive file
#[async_trait]
pub trait ArchiveReader: Send + Sync {
    /// One full scan, entries in archive declaration order
    async fn read_entries(&self, archive_file: &Path) -> Result<Vec<Entry>, ReaderError>;

    /// Whether content accessors for one archive may be opened concurrently.
    /// When false, the filesystem serializes accessor creation.
    fn supports_concurrent_streams(&self) -> bool {
        true
    }
}

/// Detects the format of each archive and dispatches to the matching reader
#[derive(Debug, Clone, Default)]
pub struct ArchiveFormatReader {
    config: ReaderConfig,
}

impl ArchiveFormatReader {
    pub fn new(config: ReaderConfig) -> Result<Self, ReaderError> {
        config.validate()?;
        Ok(Self { config })
    }
}

#[async_trait]
impl ArchiveReader for ArchiveFormatReader {
    async fn read_entries(&self, archive_file: &Path) -> Result<Vec<Entry>, ReaderError> {
        let format = FormatDetector::detect_format(archive_file).await?;
        let name = format.as_str();
        log_debug!("Reading archive as {name}", name: name);

        match format {
            ArchiveFormat::Zip => ZipReader::new(self.config.clone())
                .read_entries(archive_file)
                .await,
            ArchiveFormat::Tar | ArchiveFormat::TarGz | ArchiveFormat::TarZst => {
                TarReader::new(format, self.config.clone())
                    .read_entries(archive_file)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_config_validation() {
        assert!(ReaderConfig::default().validate().is_ok());
        assert!(matches!(
            ReaderConfig::new(0).validate(),
            Err(ReaderError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReaderConfig::default().with_max_entry_size(0).validate(),
            Err(ReaderError::InvalidConfig(_))
        ));
        assert!(ArchiveFormatReader::new(ReaderConfig::new(0)).is_err());
    }

    #[test]
    fn test_read_entry_limits() {
        let config = ReaderConfig::default().with_max_entry_size(8);

        let content = config.read_entry("ok", 8, &b"12345678"[..]).unwrap();
        assert_eq!(content, b"12345678");

        // Declared size over the limit fails before reading
        assert!(matches!(
            config.read_entry("huge", 1 << 50, &b""[..]),
            Err(ReaderError::EntryTooLarge { size, limit: 8, .. }) if size == 1 << 50
        ));

        // A header that understates the size is caught while reading
        assert!(matches!(
            config.read_entry("liar", 2, &b"123456789"[..]),
            Err(ReaderError::EntryTooLarge { .. })
        ));
    }

    #[test]
    fn test_check_count_boundary() {
        let config = ReaderConfig::new(3);
        assert!(config.check_count(3).is_ok());
        assert!(matches!(
            config.check_count(4),
            Err(ReaderError::TooManyEntries(3))
        ));
    }
}
