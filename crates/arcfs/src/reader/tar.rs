// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diagnostics::*;
use std::collections::HashMap;
use std::io::{Read, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::{ArchiveFormat, ArchiveReader, ReaderConfig, ReaderError};
use crate::content::{ContentAccessor, EntryReader, Handle};
use crate::entry::Entry;
use crate::path;

/// Reads TAR archives, plain or wrapped in gzip or zstd.
///
/// Hard links become regular files sharing the content of the entry they
/// point at. Device nodes, fifos and sparse files are skipped.
#[derive(Debug, Clone)]
pub struct TarReader {
    format: ArchiveFormat,
    config: ReaderConfig,
}

impl TarReader {
    pub fn new(format: ArchiveFormat, config: ReaderConfig) -> Self {
        Self { format, config }
    }

    fn scan(&self, archive_file: &Path) -> Result<Vec<Entry>, ReaderError> {
        let mut archive = ::tar::Archive::new(decoded_stream(self.format, archive_file)?);
        let source = Arc::new(TarSource {
            archive_file: archive_file.to_path_buf(),
            format: self.format,
            config: self.config.clone(),
        });

        let mut entries = Vec::new();
        // Normalized path -> (content, size), for resolving hard links
        let mut contents: HashMap<String, (Handle, u64)> = HashMap::new();

        for (count, item) in archive.entries()?.enumerate() {
            self.config.check_count(count + 1)?;

            let entry = item?;
            let name = entry.path()?.to_string_lossy().into_owned();
            let header = entry.header();
            let kind = header.entry_type();
            let last_modified = header
                .mtime()
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

            if kind.is_dir() {
                entries.push(Entry::directory(name, last_modified));
            } else if kind.is_symlink() {
                let target = link_target(&entry)?;
                entries.push(Entry::symlink(name, target, last_modified));
            } else if kind.is_hard_link() {
                let target = link_target(&entry)?;
                match contents.get(&path::normalize(&target)) {
                    Some((handle, size)) => {
                        let (handle, size) = (handle.clone(), *size);
                        contents.insert(path::normalize(&name), (handle.clone(), size));
                        entries.push(Entry::file(name, size, last_modified, handle));
                    }
                    None => {
                        log_warn!(
                            "Skipping hard link '{name}' to unknown entry '{target}'",
                            name: name,
                            target: target
                        );
                    }
                }
            } else if kind == ::tar::EntryType::GNUSparse {
                log_warn!("Skipping sparse file '{name}'", name: name);
            } else if kind.is_file() {
                let size = entry.size();
                let accessor = TarContent {
                    source: source.clone(),
                    name: name.clone(),
                    offset: entry.raw_file_position(),
                    size,
                };
                let handle = Handle::new(Arc::new(accessor));
                contents.insert(path::normalize(&name), (handle.clone(), size));
                entries.push(Entry::file(name, size, last_modified, handle));
            } else {
                log_debug!("Skipping special tar entry '{name}'", name: name);
            }
        }

        let count = entries.len();
        let format = self.format.as_str();
        log_debug!("Scanned {count} {format} entries", count: count, format: format);
        Ok(entries)
    }
}

#[async_trait]
impl ArchiveReader for TarReader {
    async fn read_entries(&self, archive_file: &Path) -> Result<Vec<Entry>, ReaderError> {
        self.scan(archive_file)
    }
}

fn link_target<R: Read>(entry: &::tar::Entry<'_, R>) -> Result<String, ReaderError> {
    let target = entry.link_name()?.ok_or_else(|| {
        ReaderError::Corrupt("link entry without a target".to_string())
    })?;
    Ok(target.to_string_lossy().into_owned())
}

/// The archive bytes after decompression
fn decoded_stream(
    format: ArchiveFormat,
    archive_file: &Path,
) -> Result<Box<dyn Read + Send>, ReaderError> {
    let file = std::fs::File::open(archive_file)?;
    Ok(match format {
        ArchiveFormat::TarGz => Box::new(flate2::read::GzDecoder::new(file)),
        ArchiveFormat::TarZst => Box::new(zstd::stream::read::Decoder::new(file)?),
        ArchiveFormat::Tar => Box::new(file),
        ArchiveFormat::Zip => {
            return Err(ReaderError::UnsupportedFormat(
                "zip passed to the tar reader".to_string(),
            ));
        }
    })
}

struct TarSource {
    archive_file: PathBuf,
    format: ArchiveFormat,
    config: ReaderConfig,
}

/// Content of one tar member, located by its offset in the decoded stream
struct TarContent {
    source: Arc<TarSource>,
    name: String,
    offset: u64,
    size: u64,
}

impl TarContent {
    /// Compressed archives have to be decoded from the start. The member is
    /// held in memory, so `max_entry_size` applies.
    fn decode(&self) -> Result<Vec<u8>, ReaderError> {
        let mut stream = decoded_stream(self.source.format, &self.source.archive_file)?;
        let skipped = std::io::copy(&mut (&mut stream).take(self.offset), &mut std::io::sink())?;
        if skipped != self.offset {
            return Err(ReaderError::Corrupt(format!(
                "archive ends at {} before member data at {}",
                skipped, self.offset
            )));
        }
        self.source
            .config
            .read_entry(&self.name, self.size, stream.take(self.size))
    }
}

#[async_trait]
impl ContentAccessor for TarContent {
    async fn open(&self) -> Result<EntryReader, ReaderError> {
        match self.source.format {
            ArchiveFormat::Tar => {
                let mut file = tokio::fs::File::open(&self.source.archive_file).await?;
                _ = file.seek(SeekFrom::Start(self.offset)).await?;
                Ok(Box::pin(file.take(self.size)))
            }
            _ => Ok(Box::pin(std::io::Cursor::new(self.decode()?))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append_file<W: std::io::Write>(builder: &mut ::tar::Builder<W>, name: &str, data: &[u8]) {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        header.set_entry_type(::tar::EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }

    fn append_link<W: std::io::Write>(
        builder: &mut ::tar::Builder<W>,
        kind: ::tar::EntryType,
        name: &str,
        target: &str,
    ) {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(0);
        header.set_mode(0o777);
        header.set_entry_type(kind);
        builder.append_link(&mut header, name, target).unwrap();
    }

    fn fill<W: std::io::Write>(builder: &mut ::tar::Builder<W>) {
        append_file(builder, "src/main.rs", b"fn main() {}\n");
        append_file(builder, "README", b"tar fixture");
        append_link(builder, ::tar::EntryType::Symlink, "current", "src/main.rs");
        append_link(builder, ::tar::EntryType::Link, "README.copy", "README");
    }

    fn write_tar(path: &Path) {
        let mut builder = ::tar::Builder::new(std::fs::File::create(path).unwrap());
        fill(&mut builder);
        builder.finish().unwrap();
    }

    fn write_tar_gz(path: &Path) {
        let encoder = flate2::write::GzEncoder::new(
            std::fs::File::create(path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = ::tar::Builder::new(encoder);
        fill(&mut builder);
        _ = builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_tar_zst(path: &Path) {
        let encoder = zstd::stream::write::Encoder::new(std::fs::File::create(path).unwrap(), 3)
            .unwrap()
            .auto_finish();
        let mut builder = ::tar::Builder::new(encoder);
        fill(&mut builder);
        builder.finish().unwrap();
    }

    async fn read_all(entry: &Entry) -> Vec<u8> {
        let mut reader = entry.content.as_ref().unwrap().open().await.unwrap();
        let mut out = Vec::new();
        _ = reader.read_to_end(&mut out).await.unwrap();
        out
    }

    async fn check_fixture(format: ArchiveFormat, path: &Path) {
        let entries = TarReader::new(format, ReaderConfig::default())
            .read_entries(path)
            .await
            .unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(names, vec!["src/main.rs", "README", "current", "README.copy"]);

        assert_eq!(read_all(&entries[0]).await, b"fn main() {}\n");
        assert_eq!(read_all(&entries[1]).await, b"tar fixture");
        assert_eq!(entries[2].symlink_target.as_deref(), Some("src/main.rs"));
        assert_eq!(entries[3].size, 11);
        assert_eq!(read_all(&entries[3]).await, b"tar fixture");
        assert_eq!(entries[0].last_modified.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_plain_tar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.tar");
        write_tar(&path);
        check_fixture(ArchiveFormat::Tar, &path).await;
    }

    #[tokio::test]
    async fn test_gzip_tar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.tar.gz");
        write_tar_gz(&path);
        check_fixture(ArchiveFormat::TarGz, &path).await;
    }

    #[tokio::test]
    async fn test_zstd_tar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.tar.zst");
        write_tar_zst(&path);
        check_fixture(ArchiveFormat::TarZst, &path).await;
    }

    #[tokio::test]
    async fn test_entry_limit_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.tar");
        write_tar(&path);

        let result = TarReader::new(ArchiveFormat::Tar, ReaderConfig::new(3))
            .read_entries(&path)
            .await;
        assert!(matches!(result, Err(ReaderError::TooManyEntries(3))));
    }

    #[tokio::test]
    async fn test_compressed_member_over_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.tar.gz");
        write_tar_gz(&path);

        let config = ReaderConfig::default().with_max_entry_size(12);
        let entries = TarReader::new(ArchiveFormat::TarGz, config)
            .read_entries(&path)
            .await
            .unwrap();

        let result = entries[0].content.as_ref().unwrap().open().await;
        assert!(matches!(
            result,
            Err(ReaderError::EntryTooLarge { size: 13, limit: 12, .. })
        ));
        assert_eq!(read_all(&entries[1]).await, b"tar fixture");
    }

    /// Descriptors of this process that point at `path`
    #[cfg(target_os = "linux")]
    fn open_descriptors(path: &Path) -> usize {
        let path = path.canonicalize().unwrap();
        std::fs::read_dir("/proc/self/fd")
            .unwrap()
            .filter_map(|fd| std::fs::read_link(fd.ok()?.path()).ok())
            .filter(|target| *target == path)
            .count()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropped_stream_releases_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.tar");
        write_tar(&path);

        let entries = TarReader::new(ArchiveFormat::Tar, ReaderConfig::default())
            .read_entries(&path)
            .await
            .unwrap();
        assert_eq!(open_descriptors(&path), 0);

        let mut reader = entries[0].content.as_ref().unwrap().open().await.unwrap();
        let mut head = [0u8; 2];
        reader.read_exact(&mut head).await.unwrap();
        assert_eq!(&head, b"fn");
        assert_eq!(open_descriptors(&path), 1);

        drop(reader);
        assert_eq!(open_descriptors(&path), 0);
    }
}
