// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arcfs::reader::ReaderConfig;
use arcfs::{
    ArchiveFileSystem, ArchiveFileSystemProvider, ArchivePath, ArchiveUri, EntryType,
    FileSystemRegistry, SCHEME,
};

/// One opened archive plus the provider used to reach it
pub struct ArchiveContext {
    provider: ArchiveFileSystemProvider,
    fs: Arc<ArchiveFileSystem>,
    /// Where relative paths start: the URI fragment, or the root
    base: ArchivePath,
}

impl ArchiveContext {
    /// Opens `target`, either a host path or an `archive:` URI. A URI
    /// fragment becomes the base for relative paths.
    pub async fn open(target: &str, max_entries: Option<usize>) -> Result<Self> {
        let registry = match max_entries {
            Some(limit) => FileSystemRegistry::with_config(ReaderConfig::new(limit))?,
            None => FileSystemRegistry::default(),
        };
        let provider = ArchiveFileSystemProvider::new(Arc::new(registry));

        let (fs, base) = if target.starts_with(&format!("{}:", SCHEME)) {
            let uri = ArchiveUri::parse(target)?;
            let fs = provider
                .new_file_system(target)
                .await
                .with_context(|| format!("Failed to open archive {}", target))?;
            let base = fs.get_path(&uri.path);
            (fs, base)
        } else {
            let fs = provider
                .new_file_system_from_path(Path::new(target))
                .await
                .with_context(|| format!("Failed to open archive {}", target))?;
            let base = fs.root_path();
            (fs, base)
        };

        diagnostics::log_debug!(
            "Opened {target} for browsing at {base}",
            target: target,
            base: base.to_string()
        );
        Ok(Self { provider, fs, base })
    }

    pub fn provider(&self) -> &ArchiveFileSystemProvider {
        &self.provider
    }

    pub fn fs(&self) -> &Arc<ArchiveFileSystem> {
        &self.fs
    }

    pub fn base(&self) -> &ArchivePath {
        &self.base
    }

    /// Resolves `path` against the base; a leading `/` starts at the root
    pub fn path(&self, path: &str) -> ArchivePath {
        self.base.join(path)
    }

    pub fn close(self) {
        _ = self.provider.registry().shutdown();
    }
}

/// Helper function to format file sizes
pub fn format_file_size(size: u64) -> String {
    if size >= 1024 * 1024 {
        format!("{:.1}MB", size as f64 / (1024.0 * 1024.0))
    } else if size >= 1024 {
        format!("{:.1}KB", size as f64 / 1024.0)
    } else {
        format!("{}B", size)
    }
}

/// `ls -l` style type marker
pub fn kind_marker(entry_type: EntryType) -> char {
    match entry_type {
        EntryType::Directory => 'd',
        EntryType::File => '-',
        EntryType::Symlink => 'l',
    }
}
