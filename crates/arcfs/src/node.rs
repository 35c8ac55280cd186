// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::EntryType;
use crate::entry::Entry;

pub const ROOT_ID: NodeID = NodeID(0);

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeID(usize);

impl std::fmt::Display for NodeID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeID {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }

    pub fn is_root(self) -> bool {
        self == ROOT_ID
    }
}

/// Children of a directory: lookup by name, iteration in insertion order
#[derive(Debug, Default)]
pub(crate) struct Children {
    order: Vec<NodeID>,
    by_name: HashMap<String, NodeID>,
}

impl Children {
    pub(crate) fn get(&self, name: &str) -> Option<NodeID> {
        self.by_name.get(name).copied()
    }

    pub(crate) fn insert(&mut self, name: String, id: NodeID) {
        if self.by_name.insert(name, id).is_none() {
            self.order.push(id);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.by_name.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn ids(&self) -> &[NodeID] {
        &self.order
    }
}

/// A node of the archive tree.
///
/// Directories own their children through the arena; `parent` is only an
/// index back up, used to rebuild paths.
#[derive(Debug)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) entry_type: EntryType,
    pub(crate) parent: Option<NodeID>,
    pub(crate) children: Children,
    pub(crate) entry: Option<Entry>,
}

impl Node {
    pub(crate) fn new(
        name: String,
        entry_type: EntryType,
        parent: Option<NodeID>,
        entry: Option<Entry>,
    ) -> Self {
        Self {
            name,
            entry_type,
            parent,
            children: Children::default(),
            entry,
        }
    }

    /// Final path segment; empty for the root
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn parent(&self) -> Option<NodeID> {
        self.parent
    }

    /// The originating entry, absent for synthesized directories
    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    /// Directory implied by a path prefix but never declared
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.entry.is_none()
    }

    pub fn child(&self, name: &str) -> Option<NodeID> {
        self.children.get(name)
    }

    /// Child ids in insertion order
    pub fn children(&self) -> &[NodeID] {
        self.children.ids()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn size(&self) -> u64 {
        self.entry.as_ref().map(|e| e.size).unwrap_or(0)
    }

    /// Synthesized nodes report the Unix epoch
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.entry
            .as_ref()
            .map(|e| e.last_modified)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}
