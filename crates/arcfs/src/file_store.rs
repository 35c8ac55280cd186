// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use crate::attributes::AttributeViewKind;
use crate::error::Result;
use crate::reader::{ArchiveFormat, FormatDetector};

/// The store behind an archive filesystem: the archive file itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFileStore {
    archive_file: PathBuf,
    format: Option<ArchiveFormat>,
}

impl ArchiveFileStore {
    /// Probes the archive format; an unreadable file yields a store of
    /// unknown type rather than an error.
    pub async fn new(archive_file: &Path) -> Self {
        let format = FormatDetector::detect_format(archive_file).await.ok();
        Self {
            archive_file: archive_file.to_path_buf(),
            format,
        }
    }

    pub fn name(&self) -> String {
        self.archive_file.display().to_string()
    }

    pub fn store_type(&self) -> &'static str {
        self.format.map(|f| f.as_str()).unwrap_or("archive")
    }

    pub fn is_read_only(&self) -> bool {
        true
    }

    /// Size of the archive file on the host
    pub async fn total_space(&self) -> Result<u64> {
        Ok(tokio::fs::metadata(&self.archive_file).await?.len())
    }

    pub fn usable_space(&self) -> u64 {
        0
    }

    pub fn unallocated_space(&self) -> u64 {
        0
    }

    pub fn supports_attribute_view(&self, kind: AttributeViewKind) -> bool {
        kind.is_supported()
    }
}
