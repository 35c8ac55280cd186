// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Builds the immutable node tree from an archive's flat entry list.

use diagnostics::*;

use crate::EntryType;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::node::{Node, NodeID, ROOT_ID};
use crate::path;

/// Counts over the reachable part of a tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FsStats {
    pub files: usize,
    pub directories: usize,
    pub synthetic_directories: usize,
    pub symlinks: usize,
    /// Sum of regular file sizes
    pub total_size: u64,
}

/// Arena of nodes rooted at a synthetic root directory.
///
/// Never mutated once [`Tree::build`] returns.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// One pass over `entries`, in scan order.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut builder = TreeBuilder::new();
        for entry in entries {
            builder.insert(entry);
        }
        builder.finish()
    }

    pub fn root(&self) -> NodeID {
        ROOT_ID
    }

    pub fn get(&self, id: NodeID) -> Option<&Node> {
        self.nodes.get(id.as_usize())
    }

    /// Ids handed out by this tree are always in range
    pub(crate) fn node(&self, id: NodeID) -> &Node {
        &self.nodes[id.as_usize()]
    }

    /// Walks from the root one segment at a time.
    ///
    /// Symlinks are never followed: a symlink in an intermediate position is
    /// reported as `NotADirectory`, and a final symlink resolves to itself.
    pub fn lookup(&self, path: &str) -> Result<NodeID> {
        let mut current = ROOT_ID;
        let mut walked = String::new();
        for name in path::segments(path) {
            let node = self.node(current);
            if !node.entry_type.is_directory() {
                return Err(Error::not_a_directory(&walked, node.entry_type));
            }
            current = node
                .child(name)
                .ok_or_else(|| Error::not_found(path::normalize(path)))?;
            walked = path::join(&walked, name);
        }
        Ok(current)
    }

    /// Rebuilds the normalized path of `id` from its parent chain
    pub fn path_of(&self, id: NodeID) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur.is_root() {
                break;
            }
            let node = self.node(cur);
            names.push(node.name.as_str());
            current = node.parent;
        }
        names.reverse();
        names.join("/")
    }

    pub fn stats(&self) -> FsStats {
        let mut stats = FsStats::default();
        let mut pending = vec![ROOT_ID];
        while let Some(id) = pending.pop() {
            let node = self.node(id);
            match node.entry_type {
                EntryType::File => {
                    stats.files += 1;
                    stats.total_size += node.size();
                }
                EntryType::Symlink => stats.symlinks += 1,
                EntryType::Directory => {
                    if !id.is_root() {
                        stats.directories += 1;
                        if node.is_synthetic() {
                            stats.synthetic_directories += 1;
                        }
                    }
                    pending.extend_from_slice(node.children());
                }
            }
        }
        stats
    }
}

struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    fn new() -> Self {
        let root = Node::new(String::new(), EntryType::Directory, None, None);
        Self { nodes: vec![root] }
    }

    fn finish(self) -> Tree {
        Tree { nodes: self.nodes }
    }

    fn add_child(
        &mut self,
        parent: NodeID,
        name: &str,
        entry_type: EntryType,
        entry: Option<Entry>,
    ) -> NodeID {
        let id = NodeID::new(self.nodes.len());
        self.nodes
            .push(Node::new(name.to_string(), entry_type, Some(parent), entry));
        self.nodes[parent.as_usize()]
            .children
            .insert(name.to_string(), id);
        id
    }

    /// Returns the directory `name` under `parent`, creating a synthetic
    /// one if needed. A non-directory in the way becomes a synthetic
    /// directory: the entry being inserted is later in scan order.
    fn ensure_dir(&mut self, parent: NodeID, name: &str) -> NodeID {
        let existing = self.nodes[parent.as_usize()].children.get(name);
        match existing {
            Some(id) => {
                let node = &mut self.nodes[id.as_usize()];
                if !node.entry_type.is_directory() {
                    let was = node.entry_type.as_str();
                    log_debug!(
                        "Replacing {was} '{name}' with an implied directory",
                        was: was,
                        name: name
                    );
                    node.entry_type = EntryType::Directory;
                    node.entry = None;
                }
                id
            }
            None => self.add_child(parent, name, EntryType::Directory, None),
        }
    }

    fn insert(&mut self, entry: Entry) {
        if path::has_parent_segments(&entry.path) {
            let raw = entry.path.as_str();
            log_warn!(
                "Entry path contains '..', normalized within the archive root: {raw}",
                raw: raw
            );
        }

        let segments: Vec<String> = path::segments(&entry.path)
            .into_iter()
            .map(str::to_string)
            .collect();

        let Some((last, dirs)) = segments.split_last() else {
            if entry.entry_type.is_directory() {
                self.nodes[ROOT_ID.as_usize()].entry = Some(entry);
            } else {
                let raw = entry.path.as_str();
                log_warn!("Ignoring non-directory entry at the archive root: '{raw}'", raw: raw);
            }
            return;
        };

        let mut parent = ROOT_ID;
        for name in dirs {
            parent = self.ensure_dir(parent, name);
        }

        let existing = self.nodes[parent.as_usize()].children.get(last);
        match existing {
            Some(id) => self.replace(id, entry),
            None => {
                let entry_type = entry.entry_type;
                _ = self.add_child(parent, last, entry_type, Some(entry));
            }
        }
    }

    /// Last write wins. A directory re-declared as a directory keeps its
    /// children and takes the new metadata.
    fn replace(&mut self, id: NodeID, entry: Entry) {
        let node = &mut self.nodes[id.as_usize()];
        if !(node.entry_type.is_directory() && entry.entry_type.is_directory()) {
            if node.children.len() > 0 {
                let path = entry.path.as_str();
                let count = node.children.len();
                log_warn!(
                    "Entry '{path}' replaces a directory with {count} children",
                    path: path,
                    count: count
                );
                node.children.clear();
            }
            node.entry_type = entry.entry_type;
        }
        node.entry = Some(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContent;
    use chrono::{DateTime, Utc};

    fn file(path: &str, size: u64) -> Entry {
        Entry::file(
            path,
            size,
            DateTime::<Utc>::UNIX_EPOCH,
            MemoryContent::new_handle(vec![0u8; size as usize]),
        )
    }

    fn dir(path: &str) -> Entry {
        Entry::directory(path, DateTime::<Utc>::UNIX_EPOCH)
    }

    fn child_names(tree: &Tree, id: NodeID) -> Vec<String> {
        tree.node(id)
            .children()
            .iter()
            .map(|c| tree.node(*c).name().to_string())
            .collect()
    }

    #[test]
    fn test_implied_directories_are_synthesized() {
        let tree = Tree::build(vec![file("a/b/c.txt", 10)]);

        let a = tree.lookup("a").unwrap();
        let b = tree.lookup("a/b").unwrap();
        assert!(tree.node(a).entry_type().is_directory());
        assert!(tree.node(a).is_synthetic());
        assert!(tree.node(b).is_synthetic());
        assert_eq!(child_names(&tree, a), vec!["b"]);
        assert_eq!(tree.node(tree.lookup("a/b/c.txt").unwrap()).size(), 10);
    }

    #[test]
    fn test_explicit_directory_attaches_to_synthetic() {
        let tree = Tree::build(vec![file("a/x", 1), dir("a/")]);

        let a = tree.lookup("a").unwrap();
        assert!(!tree.node(a).is_synthetic());
        assert_eq!(child_names(&tree, a), vec!["x"]);
    }

    #[test]
    fn test_duplicate_path_last_write_wins() {
        let tree = Tree::build(vec![file("x.txt", 3), file("x.txt", 7)]);

        let x = tree.lookup("x.txt").unwrap();
        assert_eq!(tree.node(x).size(), 7);
        assert_eq!(child_names(&tree, ROOT_ID), vec!["x.txt"]);
    }

    #[test]
    fn test_file_replacing_directory_drops_children() {
        let tree = Tree::build(vec![file("d/inner", 1), file("d", 2)]);

        let d = tree.lookup("d").unwrap();
        assert_eq!(tree.node(d).entry_type(), EntryType::File);
        assert_eq!(tree.node(d).child_count(), 0);
        assert!(matches!(
            tree.lookup("d/inner"),
            Err(Error::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_file_in_the_way_becomes_directory() {
        let tree = Tree::build(vec![file("p", 1), file("p/q", 2)]);

        let p = tree.lookup("p").unwrap();
        assert!(tree.node(p).entry_type().is_directory());
        assert!(tree.node(p).is_synthetic());
        assert!(tree.lookup("p/q").is_ok());
    }

    #[test]
    fn test_odd_slashes_are_skipped() {
        let tree = Tree::build(vec![file("/lead//double/trail.txt/", 4)]);
        assert!(tree.lookup("lead/double/trail.txt").is_ok());
    }

    #[test]
    fn test_root_entries() {
        let tree = Tree::build(vec![dir("/"), dir("./"), file("", 1)]);
        assert!(tree.node(ROOT_ID).entry().is_some());
        assert_eq!(tree.node(ROOT_ID).child_count(), 0);
    }

    #[test]
    fn test_path_reconstruction_matches_lookup() {
        let paths = ["a/b/c.txt", "a/d", "e", "f/g/h/i/j"];
        let tree = Tree::build(paths.iter().map(|p| file(p, 1)));

        for p in paths {
            let id = tree.lookup(p).unwrap();
            assert_eq!(tree.path_of(id), p);
        }
        assert_eq!(tree.path_of(tree.lookup("/a/b/").unwrap()), "a/b");
        assert_eq!(tree.path_of(ROOT_ID), "");
    }

    #[test]
    fn test_lookup_errors() {
        let tree = Tree::build(vec![file("a/file", 1)]);

        match tree.lookup("a/missing") {
            Err(Error::NotFound(p)) => assert_eq!(p, "a/missing"),
            other => panic!("unexpected {:?}", other),
        }
        match tree.lookup("a/file/below") {
            Err(Error::NotADirectory { path, actual }) => {
                assert_eq!(path, "a/file");
                assert_eq!(actual, EntryType::File);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_stats_count_reachable_nodes() {
        let tree = Tree::build(vec![
            file("a/b/c.txt", 10),
            dir("a"),
            Entry::symlink("l", "a/b/c.txt", DateTime::<Utc>::UNIX_EPOCH),
            file("d/gone", 5),
            file("d", 1),
        ]);

        let stats = tree.stats();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 2);
        assert_eq!(stats.synthetic_directories, 1);
        assert_eq!(stats.symlinks, 1);
        assert_eq!(stats.total_size, 11);
    }
}
