// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The `archive:` filesystem provider: URI identity and every file operation
//! entry point, routed to the registry and the per-archive filesystems.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use crate::archive_path::ArchivePath;
use crate::attributes::{ArchiveAttributeView, AttributeViewKind, BasicAttributes};
use crate::content::EntryReader;
use crate::dir::{DirectoryFilter, DirectoryStream};
use crate::error::{Error, Result};
use crate::file_store::ArchiveFileStore;
use crate::fs::ArchiveFileSystem;
use crate::options::{AccessMode, OpenOption, validate_read_only};
use crate::registry::FileSystemRegistry;
use crate::uri::{ArchiveUri, SCHEME};

pub struct ArchiveFileSystemProvider {
    registry: Arc<FileSystemRegistry>,
}

impl ArchiveFileSystemProvider {
    pub fn new(registry: Arc<FileSystemRegistry>) -> Self {
        Self { registry }
    }

    pub fn scheme(&self) -> &'static str {
        SCHEME
    }

    pub fn registry(&self) -> &Arc<FileSystemRegistry> {
        &self.registry
    }

    /// Opens and registers the filesystem of the archive a URI names. The
    /// fragment is ignored.
    pub async fn new_file_system(&self, uri: &str) -> Result<Arc<ArchiveFileSystem>> {
        let uri = ArchiveUri::parse(uri)?;
        self.registry.open(&uri.archive_file).await
    }

    pub async fn new_file_system_from_path(
        &self,
        archive_file: &Path,
    ) -> Result<Arc<ArchiveFileSystem>> {
        self.registry.open(archive_file).await
    }

    pub async fn get_file_system(&self, uri: &str) -> Result<Arc<ArchiveFileSystem>> {
        let uri = ArchiveUri::parse(uri)?;
        self.registry.get(&uri.archive_file).await
    }

    /// The path a URI names, in an already open filesystem
    pub async fn get_path(&self, uri: &str) -> Result<ArchivePath> {
        let uri = ArchiveUri::parse(uri)?;
        let fs = self.registry.get(&uri.archive_file).await?;
        Ok(fs.get_path(&uri.path))
    }

    pub async fn new_input_stream(
        &self,
        file: &ArchivePath,
        options: &[OpenOption],
    ) -> Result<EntryReader> {
        validate_read_only(options)?;
        file.file_system().new_input_stream(file.as_str()).await
    }

    /// Random access is not offered; read through `new_input_stream`
    pub fn new_byte_channel(
        &self,
        _file: &ArchivePath,
        options: &[OpenOption],
    ) -> Result<Infallible> {
        validate_read_only(options)?;
        Err(Error::unsupported_operation("byte channel"))
    }

    pub fn new_file_channel(
        &self,
        _file: &ArchivePath,
        options: &[OpenOption],
    ) -> Result<Infallible> {
        validate_read_only(options)?;
        Err(Error::unsupported_operation("file channel"))
    }

    pub fn new_directory_stream(
        &self,
        dir: &ArchivePath,
        filter: DirectoryFilter,
    ) -> Result<DirectoryStream> {
        DirectoryStream::open(dir.file_system().clone(), dir.as_str(), filter)
    }

    pub fn create_directory(&self, dir: &ArchivePath) -> Result<()> {
        dir.file_system().create_directory(dir.as_str())
    }

    pub fn create_symbolic_link(&self, link: &ArchivePath, target: &str) -> Result<()> {
        link.file_system().create_symbolic_link(link.as_str(), target)
    }

    pub fn create_link(&self, link: &ArchivePath, existing: &ArchivePath) -> Result<()> {
        link.file_system()
            .create_link(link.as_str(), existing.as_str())
    }

    pub fn delete(&self, path: &ArchivePath) -> Result<()> {
        path.file_system().delete(path.as_str())
    }

    pub fn copy(&self, source: &ArchivePath, target: &ArchivePath) -> Result<()> {
        source.file_system().copy(source.as_str(), target.as_str())
    }

    pub fn move_entry(&self, source: &ArchivePath, target: &ArchivePath) -> Result<()> {
        source
            .file_system()
            .move_entry(source.as_str(), target.as_str())
    }

    pub fn set_attribute(&self, path: &ArchivePath, attribute: &str) -> Result<()> {
        path.file_system().set_attribute(path.as_str(), attribute)
    }

    pub fn read_symbolic_link(&self, link: &ArchivePath) -> Result<String> {
        link.file_system().read_symbolic_link(link.as_str())
    }

    pub fn check_access(&self, path: &ArchivePath, modes: &[AccessMode]) -> Result<()> {
        path.file_system().check_access(path.as_str(), modes)
    }

    pub fn get_file_attribute_view(
        &self,
        path: &ArchivePath,
        kind: AttributeViewKind,
    ) -> Result<ArchiveAttributeView> {
        if !kind.is_supported() {
            return Err(Error::unsupported_view(kind.as_str()));
        }
        Ok(ArchiveAttributeView::new(path.clone()))
    }

    pub fn read_attributes(&self, path: &ArchivePath) -> Result<BasicAttributes> {
        self.get_file_attribute_view(path, AttributeViewKind::Basic)?
            .read_attributes()
    }

    /// Attribute lookup by name string, e.g. `"basic:size,lastModifiedTime"`
    pub fn read_attributes_by_name(
        &self,
        _path: &ArchivePath,
        attributes: &str,
    ) -> Result<BTreeMap<String, String>> {
        Err(Error::unsupported_operation(format!(
            "read attributes by name: {}",
            attributes
        )))
    }

    /// Same instance and path, or same archive file and same entry path
    #[must_use]
    pub fn is_same_file(&self, a: &ArchivePath, b: &ArchivePath) -> bool {
        if a == b {
            return true;
        }
        a.file_system().archive_file() == b.file_system().archive_file()
            && a.as_str() == b.as_str()
    }

    /// Archives have no hidden-file notion
    pub fn is_hidden(&self, _path: &ArchivePath) -> bool {
        false
    }

    pub async fn get_file_store(&self, path: &ArchivePath) -> ArchiveFileStore {
        ArchiveFileStore::new(path.file_system().archive_file()).await
    }
}
