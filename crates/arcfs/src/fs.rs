// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use diagnostics::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

use crate::EntryType;
use crate::archive_path::ArchivePath;
use crate::attributes::BasicAttributes;
use crate::content::EntryReader;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::node::{Node, NodeID};
use crate::options::AccessMode;
use crate::path;
use crate::registry::RegistryState;
use crate::tree::{FsStats, Tree};

/// A read-only filesystem over one archive file.
///
/// The tree is built once at construction and never changes. All lookups
/// take `&self` and run without locks.
pub struct ArchiveFileSystem {
    archive_file: PathBuf,
    tree: Tree,
    open: AtomicBool,
    /// Present when the reader cannot open content accessors concurrently
    stream_gate: Option<Mutex<()>>,
    registry: Weak<RegistryState>,
}

impl std::fmt::Debug for ArchiveFileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveFileSystem")
            .field("archive_file", &self.archive_file)
            .field("open", &self.is_open())
            .finish()
    }
}

impl ArchiveFileSystem {
    pub(crate) fn new(
        archive_file: PathBuf,
        entries: Vec<Entry>,
        concurrent_streams: bool,
        registry: Weak<RegistryState>,
    ) -> Self {
        let tree = Tree::build(entries);

        let stats = tree.stats();
        let archive = archive_file.display().to_string();
        log_info!(
            "Tree of {archive}: {files} files, {dirs} dirs ({implied} implied), {links} links",
            archive: archive,
            files: stats.files,
            dirs: stats.directories,
            implied: stats.synthetic_directories,
            links: stats.symlinks
        );

        Self {
            archive_file,
            tree,
            open: AtomicBool::new(true),
            stream_gate: (!concurrent_streams).then(|| Mutex::new(())),
            registry,
        }
    }

    /// A filesystem over an already scanned entry list, outside any registry
    pub fn from_entries<P: Into<PathBuf>>(archive_file: P, entries: Vec<Entry>) -> Arc<Self> {
        Arc::new(Self::new(archive_file.into(), entries, true, Weak::new()))
    }

    pub fn archive_file(&self) -> &Path {
        &self.archive_file
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn is_read_only(&self) -> bool {
        true
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::closed(&self.archive_file))
        }
    }

    /// Marks the filesystem closed and removes it from its registry, if the
    /// registry still maps the archive file to this instance. Closing twice
    /// is a no-op.
    pub fn close(&self) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(state) = self.registry.upgrade() {
            _ = state.remove_if_matches(&self.archive_file, self);
        }
        let archive = self.archive_file.display().to_string();
        log_info!("Closed archive filesystem {archive}", archive: archive);
    }

    pub(crate) fn mark_closed(&self) -> bool {
        self.open.swap(false, Ordering::SeqCst)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn stats(&self) -> FsStats {
        self.tree.stats()
    }

    /// Resolves an archive-internal path to its node. Symlinks are not
    /// followed, neither in intermediate positions nor at the end.
    pub fn resolve(&self, path: &str) -> Result<NodeID> {
        self.ensure_open()?;
        self.tree.lookup(path)
    }

    fn resolve_node(&self, path: &str) -> Result<&Node> {
        let id = self.resolve(path)?;
        Ok(self.tree.node(id))
    }

    pub fn path_of(&self, id: NodeID) -> String {
        self.tree.path_of(id)
    }

    /// Full paths of the direct children of `dir`, in archive order
    pub fn get_children(&self, dir: &str) -> Result<Vec<String>> {
        let node = self.resolve_node(dir)?;
        if !node.entry_type().is_directory() {
            return Err(Error::not_a_directory(path::normalize(dir), node.entry_type()));
        }
        Ok(node
            .children()
            .iter()
            .map(|id| self.tree.path_of(*id))
            .collect())
    }

    /// The stored target, verbatim
    pub fn read_symbolic_link(&self, link: &str) -> Result<String> {
        let node = self.resolve_node(link)?;
        match (node.entry_type(), node.entry()) {
            (EntryType::Symlink, Some(entry)) => {
                Ok(entry.symlink_target.clone().unwrap_or_default())
            }
            (actual, _) => Err(Error::not_a_symlink(path::normalize(link), actual)),
        }
    }

    /// Opens a fresh reader over a regular file's content. Readers are
    /// independent of each other and of tree lookups.
    pub async fn new_input_stream(&self, file: &str) -> Result<EntryReader> {
        let node = self.resolve_node(file)?;
        if node.entry_type() != EntryType::File {
            return Err(Error::not_a_file(path::normalize(file), node.entry_type()));
        }
        let handle = node
            .entry()
            .and_then(|entry| entry.content.clone())
            .ok_or_else(|| {
                Error::unsupported_operation(format!("no content for {}", path::normalize(file)))
            })?;

        let _gate = match &self.stream_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };
        handle
            .open()
            .await
            .map_err(|e| Error::archive_read(&self.archive_file, e))
    }

    pub fn get_entry(&self, path: &str) -> Result<BasicAttributes> {
        let id = self.resolve(path)?;
        Ok(BasicAttributes::from_node(self, id))
    }

    /// Every entry is readable; nothing is writable or executable
    pub fn check_access(&self, path: &str, modes: &[AccessMode]) -> Result<()> {
        _ = self.resolve(path)?;
        if modes
            .iter()
            .any(|m| matches!(m, AccessMode::Write | AccessMode::Execute))
        {
            return Err(Error::access_denied(path::normalize(path), modes));
        }
        Ok(())
    }

    pub fn get_path(self: &Arc<Self>, path: &str) -> ArchivePath {
        ArchivePath::new(self.clone(), path)
    }

    pub fn root_path(self: &Arc<Self>) -> ArchivePath {
        ArchivePath::new(self.clone(), "")
    }

    pub fn create_directory(&self, _dir: &str) -> Result<()> {
        Err(Error::read_only("create directory"))
    }

    pub fn create_symbolic_link(&self, _link: &str, _target: &str) -> Result<()> {
        Err(Error::read_only("create symbolic link"))
    }

    pub fn create_link(&self, _link: &str, _existing: &str) -> Result<()> {
        Err(Error::read_only("create link"))
    }

    pub fn delete(&self, _path: &str) -> Result<()> {
        Err(Error::read_only("delete"))
    }

    pub fn copy(&self, _source: &str, _target: &str) -> Result<()> {
        Err(Error::read_only("copy"))
    }

    pub fn move_entry(&self, _source: &str, _target: &str) -> Result<()> {
        Err(Error::read_only("move"))
    }

    pub fn set_attribute(&self, _path: &str, _attribute: &str) -> Result<()> {
        Err(Error::read_only("set attribute"))
    }
}
