// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diagnostics::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{ArchiveReader, ReaderConfig, ReaderError};
use crate::content::{ContentAccessor, EntryReader, Handle};
use crate::entry::Entry;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Reads ZIP archives.
///
/// Symlinks are recognized from the Unix mode bits in the external
/// attributes; their target is the entry payload.
#[derive(Debug, Clone, Default)]
pub struct ZipReader {
    config: ReaderConfig,
}

/// Metadata of one central directory record
struct Record {
    name: String,
    is_dir: bool,
    is_symlink: bool,
    size: u64,
    last_modified: DateTime<Utc>,
}

impl ZipReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    fn scan(&self, archive_file: &Path) -> Result<Vec<Entry>, ReaderError> {
        let file = std::fs::File::open(archive_file)?;
        let mut archive = ::zip::ZipArchive::new(file)?;
        self.config.check_count(archive.len())?;

        let source = Arc::new(archive_file.to_path_buf());
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            // Raw access works for encrypted records too
            let record = {
                let raw = archive.by_index_raw(index)?;
                Record {
                    name: raw.name().to_string(),
                    is_dir: raw.is_dir(),
                    is_symlink: raw
                        .unix_mode()
                        .map(|mode| mode & S_IFMT == S_IFLNK)
                        .unwrap_or(false),
                    size: raw.size(),
                    last_modified: raw
                        .last_modified()
                        .and_then(to_chrono)
                        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                }
            };

            if record.is_dir {
                entries.push(Entry::directory(record.name, record.last_modified));
            } else if record.is_symlink {
                let raw = self.config.read_entry(
                    &record.name,
                    record.size,
                    &mut archive.by_index(index)?,
                )?;
                let target = String::from_utf8_lossy(&raw).into_owned();
                entries.push(Entry::symlink(record.name, target, record.last_modified));
            } else {
                let accessor = ZipContent {
                    archive_file: source.clone(),
                    name: record.name.clone(),
                    index,
                    size: record.size,
                    config: self.config.clone(),
                };
                entries.push(Entry::file(
                    record.name,
                    record.size,
                    record.last_modified,
                    Handle::new(Arc::new(accessor)),
                ));
            }
        }

        let count = entries.len();
        log_debug!("Scanned {count} ZIP records", count: count);
        Ok(entries)
    }
}

#[async_trait]
impl ArchiveReader for ZipReader {
    async fn read_entries(&self, archive_file: &Path) -> Result<Vec<Entry>, ReaderError> {
        self.scan(archive_file)
    }
}

/// ZIP dates carry no zone; they are taken as UTC
fn to_chrono(dt: ::zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()))?
        .and_hms_opt(
            u32::from(dt.hour()),
            u32::from(dt.minute()),
            u32::from(dt.second()),
        )
        .map(|naive| naive.and_utc())
}

/// Content of one ZIP record.
///
/// Each open reads the central directory again and inflates the record
/// into memory, bounded by `max_entry_size`; the archive file handle is
/// closed before `open` returns.
struct ZipContent {
    archive_file: Arc<PathBuf>,
    name: String,
    index: usize,
    size: u64,
    config: ReaderConfig,
}

impl ZipContent {
    fn inflate(&self) -> Result<Vec<u8>, ReaderError> {
        let file = std::fs::File::open(self.archive_file.as_path())?;
        let mut archive = ::zip::ZipArchive::new(file)?;
        let mut record = archive.by_index(self.index)?;
        self.config.read_entry(&self.name, self.size, &mut record)
    }
}

#[async_trait]
impl ContentAccessor for ZipContent {
    async fn open(&self) -> Result<EntryReader, ReaderError> {
        let content = self.inflate()?;
        Ok(Box::pin(std::io::Cursor::new(content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::AsyncReadExt;

    fn write_fixture(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ::zip::ZipWriter::new(file);
        let stored = ::zip::write::SimpleFileOptions::default()
            .compression_method(::zip::CompressionMethod::Stored);
        let deflated = ::zip::write::SimpleFileOptions::default()
            .compression_method(::zip::CompressionMethod::Deflated);

        writer.add_directory("docs/", stored).unwrap();
        writer.start_file("docs/readme.txt", deflated).unwrap();
        writer.write_all(b"hello from zip").unwrap();
        writer.start_file("raw.bin", stored).unwrap();
        writer.write_all(&[1, 2, 3, 4]).unwrap();
        writer
            .add_symlink("latest", "docs/readme.txt", stored)
            .unwrap();
        _ = writer.finish().unwrap();
    }

    #[tokio::test]
    async fn test_scan_reports_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.zip");
        write_fixture(&path);

        let entries = ZipReader::default().read_entries(&path).await.unwrap();
        let summary: Vec<_> = entries
            .iter()
            .map(|e| (e.path.as_str(), e.entry_type, e.size))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("docs/", crate::EntryType::Directory, 0),
                ("docs/readme.txt", crate::EntryType::File, 14),
                ("raw.bin", crate::EntryType::File, 4),
                ("latest", crate::EntryType::Symlink, 15),
            ]
        );
        assert_eq!(entries[3].symlink_target.as_deref(), Some("docs/readme.txt"));
    }

    #[tokio::test]
    async fn test_content_opens_independently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.zip");
        write_fixture(&path);

        let entries = ZipReader::default().read_entries(&path).await.unwrap();
        let handle = entries[1].content.clone().unwrap();

        let mut first = handle.open().await.unwrap();
        let mut second = handle.open().await.unwrap();

        let mut a = Vec::new();
        let mut b = Vec::new();
        _ = first.read_to_end(&mut a).await.unwrap();
        _ = second.read_to_end(&mut b).await.unwrap();
        assert_eq!(a, b"hello from zip");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_entry_limit_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.zip");
        write_fixture(&path);

        let result = ZipReader::new(ReaderConfig::new(2))
            .read_entries(&path)
            .await;
        assert!(matches!(result, Err(ReaderError::TooManyEntries(2))));
    }

    #[tokio::test]
    async fn test_garbage_is_a_zip_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"PK\x03\x04 not really").unwrap();

        let result = ZipReader::default().read_entries(&path).await;
        assert!(matches!(result, Err(ReaderError::Zip(_))));
    }

    /// Replaces every occurrence of `from` in `bytes`
    fn patch(bytes: &mut [u8], from: &[u8], to: &[u8]) -> usize {
        assert_eq!(from.len(), to.len());
        let mut count = 0;
        let mut at = 0;
        while let Some(pos) = bytes[at..].windows(from.len()).position(|w| w == from) {
            bytes[at + pos..at + pos + to.len()].copy_from_slice(to);
            at += pos + to.len();
            count += 1;
        }
        count
    }

    fn crc32(data: &[u8]) -> [u8; 4] {
        let mut crc = flate2::Crc::new();
        crc.update(data);
        crc.sum().to_le_bytes()
    }

    #[tokio::test]
    async fn test_entry_size_limit_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.zip");
        write_fixture(&path);

        let config = ReaderConfig::default().with_max_entry_size(8);
        let entries = ZipReader::new(config).read_entries(&path).await.unwrap();

        // 14 bytes of deflated content are over the limit, 4 raw bytes are not
        let result = entries[1].content.as_ref().unwrap().open().await;
        assert!(matches!(
            result,
            Err(ReaderError::EntryTooLarge { size: 14, limit: 8, .. })
        ));
        assert!(entries[2].content.as_ref().unwrap().open().await.is_ok());
    }

    #[tokio::test]
    async fn test_inflated_declared_size_fails_without_allocating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lying.zip");
        {
            let mut writer = ::zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
            let stored = ::zip::write::SimpleFileOptions::default()
                .compression_method(::zip::CompressionMethod::Stored);
            writer.start_file("small.bin", stored).unwrap();
            writer.write_all(b"tiny").unwrap();
            _ = writer.finish().unwrap();
        }

        // Uncompressed size field of the central directory record
        let mut bytes = std::fs::read(&path).unwrap();
        let central = bytes
            .windows(4)
            .position(|w| w == b"PK\x01\x02")
            .unwrap();
        bytes[central + 24..central + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let entries = ZipReader::default().read_entries(&path).await.unwrap();
        assert_eq!(entries[0].size, 0xFFFF_FFF0);

        let result = entries[0].content.as_ref().unwrap().open().await;
        assert!(matches!(
            result,
            Err(ReaderError::EntryTooLarge { size: 0xFFFF_FFF0, .. })
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_symlink_target_is_lossy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.zip");
        {
            let mut writer = ::zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
            let stored = ::zip::write::SimpleFileOptions::default()
                .compression_method(::zip::CompressionMethod::Stored);
            writer.start_file("ok.txt", stored).unwrap();
            writer.write_all(b"fine").unwrap();
            writer.add_symlink("link", "QZQZQZ", stored).unwrap();
            _ = writer.finish().unwrap();
        }

        let invalid = [0xFF, 0xFE, 0xFD, 0xFF, 0xFE, 0xFD];
        let mut bytes = std::fs::read(&path).unwrap();
        assert_eq!(patch(&mut bytes, b"QZQZQZ", &invalid), 1);
        // Local and central headers both carry the CRC
        assert_eq!(patch(&mut bytes, &crc32(b"QZQZQZ"), &crc32(&invalid)), 2);
        std::fs::write(&path, &bytes).unwrap();

        let entries = ZipReader::default().read_entries(&path).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "ok.txt");
        assert_eq!(entries[1].entry_type, crate::EntryType::Symlink);
        let target = entries[1].symlink_target.as_deref().unwrap();
        assert!(target.chars().all(|c| c == char::REPLACEMENT_CHARACTER));
        assert!(!target.is_empty());
    }

    #[test]
    fn test_zip_date_conversion() {
        let dt = ::zip::DateTime::from_date_and_time(2024, 2, 29, 13, 45, 30).unwrap();
        let converted = to_chrono(dt).unwrap();
        assert_eq!(converted.to_rfc3339(), "2024-02-29T13:45:30+00:00");
    }
}
