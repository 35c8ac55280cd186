// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

use super::ReaderError;

/// Bytes needed to see the `ustar` magic of a tar header
const PROBE_LEN: usize = 512;
const USTAR_OFFSET: usize = 257;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarZst,
}

impl ArchiveFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::TarZst => "tar.zst",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format detection utilities
pub struct FormatDetector;

impl FormatDetector {
    /// Detect archive format from magic bytes, falling back to the extension
    pub async fn detect_format(path: &Path) -> Result<ArchiveFormat, ReaderError> {
        let probe = Self::read_probe(path).await?;

        if let Some(format) = Self::detect_by_magic(&probe) {
            return Ok(format);
        }

        Self::detect_by_extension(&Self::extract_extension(path))
    }

    fn extract_extension(path: &Path) -> String {
        path.extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase()
    }

    /// Reads up to `PROBE_LEN` bytes; short files yield a short probe
    async fn read_probe(path: &Path) -> Result<Vec<u8>, ReaderError> {
        let file = fs::File::open(path).await?;
        let mut probe = Vec::with_capacity(PROBE_LEN);
        _ = file.take(PROBE_LEN as u64).read_to_end(&mut probe).await?;
        Ok(probe)
    }

    fn detect_by_magic(probe: &[u8]) -> Option<ArchiveFormat> {
        match probe {
            [0x50, 0x4B, 0x03, 0x04, ..]
            | [0x50, 0x4B, 0x05, 0x06, ..]
            | [0x50, 0x4B, 0x07, 0x08, ..] => Some(ArchiveFormat::Zip),

            [0x1F, 0x8B, ..] => Some(ArchiveFormat::TarGz),

            [0x28, 0xB5, 0x2F, 0xFD, ..] => Some(ArchiveFormat::TarZst),

            _ if probe.len() >= USTAR_OFFSET + 5
                && &probe[USTAR_OFFSET..USTAR_OFFSET + 5] == b"ustar" =>
            {
                Some(ArchiveFormat::Tar)
            }

            _ => None,
        }
    }

    fn detect_by_extension(extension: &str) -> Result<ArchiveFormat, ReaderError> {
        match extension {
            "zip" | "jar" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            "gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            "zst" | "tzst" => Ok(ArchiveFormat::TarZst),
            other => Err(ReaderError::UnsupportedFormat(format!(
                "extension '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_detect_by_magic() {
        let zip_magic = [0x50, 0x4B, 0x03, 0x04, 0x00, 0x00];
        assert_eq!(
            FormatDetector::detect_by_magic(&zip_magic),
            Some(ArchiveFormat::Zip)
        );

        let gzip_magic = [0x1F, 0x8B, 0x08];
        assert_eq!(
            FormatDetector::detect_by_magic(&gzip_magic),
            Some(ArchiveFormat::TarGz)
        );

        let zstd_magic = [0x28, 0xB5, 0x2F, 0xFD, 0x00];
        assert_eq!(
            FormatDetector::detect_by_magic(&zstd_magic),
            Some(ArchiveFormat::TarZst)
        );

        let mut tar_header = vec![0u8; PROBE_LEN];
        tar_header[USTAR_OFFSET..USTAR_OFFSET + 5].copy_from_slice(b"ustar");
        assert_eq!(
            FormatDetector::detect_by_magic(&tar_header),
            Some(ArchiveFormat::Tar)
        );

        assert_eq!(FormatDetector::detect_by_magic(&[0u8; 8]), None);
        assert_eq!(FormatDetector::detect_by_magic(&[]), None);
    }

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(
            FormatDetector::detect_by_extension("jar").unwrap(),
            ArchiveFormat::Zip
        );
        assert_eq!(
            FormatDetector::detect_by_extension("tgz").unwrap(),
            ArchiveFormat::TarGz
        );
        assert!(matches!(
            FormatDetector::detect_by_extension("7z"),
            Err(ReaderError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_detect_format_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(&[0x50, 0x4B, 0x03, 0x04, 0x00, 0x00, 0x00, 0x00])
            .unwrap();

        let format = FormatDetector::detect_format(temp_file.path())
            .await
            .unwrap();
        assert_eq!(format, ArchiveFormat::Zip);
    }

    #[tokio::test]
    async fn test_unknown_short_file_is_unsupported() {
        let mut temp_file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        temp_file.write_all(b"hi").unwrap();

        let result = FormatDetector::detect_format(temp_file.path()).await;
        assert!(matches!(result, Err(ReaderError::UnsupportedFormat(_))));
    }
}
