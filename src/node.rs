//! Immutable radix-tree node and its pure edge-array operations.
//!
//! A `Node` is shared by `Arc` across tree versions once published and is
//! never mutated in place after that. A `Txn` obtains a mutable `Node` only
//! by cloning (see `txn::Txn::write_node`), so the pure edge-array helpers
//! below assume the caller already owns an exclusive copy.

use crate::route::Route;
use bitflags::bitflags;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;

bitflags! {
    /// Per-node bits that don't warrant their own field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        /// This node's key spans (or exactly ends at) the host/path
        /// boundary; forbids static-merge across it (invariant 4/5).
        const HSPLIT = 0b0000_0001;
    }
}

/// A child edge array entry. Static edges are kept sorted by `label` (the
/// first byte of the child's key); param/wildcard edges are short and
/// searched linearly, in insertion order (that order is also match-attempt
/// order).
#[derive(Debug, Clone)]
pub struct Node {
    /// First byte of `key`; used by the parent's sorted `statics` search.
    /// Meaningless (and unused) for the root node.
    pub label: u8,
    /// Literal substring (Static) or canonical placeholder (Param: `?` or
    /// regex source; Wildcard: `*` or regex source).
    pub key: Box<str>,
    /// Present iff this node is a leaf.
    pub route: Option<Arc<Route>>,
    /// Compiled constraint, only set for constrained Param/Wildcard nodes.
    pub regex: Option<Arc<Regex>>,
    pub statics: SmallVec<[Arc<Node>; 4]>,
    pub params: SmallVec<[Arc<Node>; 2]>,
    pub wildcards: SmallVec<[Arc<Node>; 2]>,
    pub flags: NodeFlags,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            label: 0,
            key: "".into(),
            route: None,
            regex: None,
            statics: SmallVec::new(),
            params: SmallVec::new(),
            wildcards: SmallVec::new(),
            flags: NodeFlags::empty(),
        }
    }
}

impl Node {
    pub fn new_static(key: impl Into<Box<str>>) -> Self {
        let key = key.into();
        let label = key.as_bytes().first().copied().unwrap_or(0);
        Node {
            label,
            key,
            ..Default::default()
        }
    }

    pub fn new_param(canonical_key: impl Into<Box<str>>, regex: Option<Arc<Regex>>) -> Self {
        Node {
            key: canonical_key.into(),
            regex,
            ..Default::default()
        }
    }

    pub fn new_wildcard(canonical_key: impl Into<Box<str>>, regex: Option<Arc<Regex>>) -> Self {
        Node {
            key: canonical_key.into(),
            regex,
            ..Default::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.route.is_some()
    }

    pub fn hsplit(&self) -> bool {
        self.flags.contains(NodeFlags::HSPLIT)
    }

    pub fn set_hsplit(&mut self, v: bool) {
        self.flags.set(NodeFlags::HSPLIT, v);
    }

    pub fn is_empty_node(&self) -> bool {
        self.route.is_none()
            && self.statics.is_empty()
            && self.params.is_empty()
            && self.wildcards.is_empty()
    }

    /// Binary search for the static edge whose `label` matches.
    pub fn get_static_edge(&self, label: u8) -> Option<usize> {
        self.statics
            .binary_search_by_key(&label, |n| n.label)
            .ok()
    }

    pub fn get_param_edge(&self, canonical_key: &str) -> Option<usize> {
        self.params.iter().position(|n| &*n.key == canonical_key)
    }

    pub fn get_wildcard_edge(&self, canonical_key: &str) -> Option<usize> {
        self.wildcards.iter().position(|n| &*n.key == canonical_key)
    }

    /// Inserts in sorted order; caller must not already hold an edge with
    /// this label (use `get_static_edge` first).
    pub fn add_static_edge(&mut self, child: Arc<Node>) {
        let pos = self
            .statics
            .partition_point(|n| n.label < child.label);
        self.statics.insert(pos, child);
    }

    pub fn replace_static_edge(&mut self, idx: usize, child: Arc<Node>) {
        self.statics[idx] = child;
    }

    pub fn del_static_edge(&mut self, idx: usize) {
        self.statics.remove(idx);
    }

    /// Appends a new param edge, keeping regex-constrained edges ahead of
    /// unconstrained ones regardless of insertion order, so that
    /// constrained-before-unconstrained match priority is a maintained
    /// invariant rather than an insertion-order coincidence.
    pub fn add_param_edge(&mut self, child: Arc<Node>) {
        insert_by_constraint(&mut self.params, child);
    }

    pub fn add_wildcard_edge(&mut self, child: Arc<Node>) {
        insert_by_constraint(&mut self.wildcards, child);
    }
}

/// Inserts `child` into `edges`, placing it just before the first
/// unconstrained entry when `child` itself carries a regex, else at the
/// back. Keeps the array partitioned constrained-then-unconstrained so
/// match order doesn't depend on the order routes were registered in.
fn insert_by_constraint(edges: &mut SmallVec<[Arc<Node>; 2]>, child: Arc<Node>) {
    if child.regex.is_some() {
        let pos = edges.iter().position(|n| n.regex.is_none()).unwrap_or(edges.len());
        edges.insert(pos, child);
    } else {
        edges.push(child);
    }
}
