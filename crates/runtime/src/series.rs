//! Node / Series: the variable-length, GC-tracked allocation every
//! non-atomic value points into (`spec.md` §3.4, §4.2).
//!
//! Grounded on the teacher's `TaggedStack` (`navicore-cem3`
//! `crates/runtime/src/tagged_stack.rs`) for the growable-array-with-
//! explicit-capacity shape and its geometric `grow`, and on its
//! `HeapObject` header (`tag` byte + refcount) for "every heap allocation
//! shares one header layout" — generalized here from a refcounted header
//! to a GC-markable one, since unlike the teacher's immutable `Variant`
//! graph, Rebol blocks and objects can form cycles (`spec.md` §4.2).

use crate::action::ParamSpec;
use crate::context::KeyEntry;
use bitflags::bitflags;
use reblang_core::cell::{Cell, NodeId};
use std::collections::HashSet;

bitflags! {
    /// `spec.md` §3.4: "flags: managed, fixed-size, protected, frozen-deep,
    /// auto-locked, external, link-node-needs-mark, misc-node-needs-mark".
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SeriesFlags: u16 {
        const MANAGED            = 1 << 0;
        const FIXED_SIZE         = 1 << 1;
        const PROTECTED          = 1 << 2;
        const FROZEN_DEEP        = 1 << 3;
        const AUTO_LOCKED        = 1 << 4;
        const EXTERNAL           = 1 << 5;
        const LINK_NEEDS_MARK    = 1 << 6;
        const MISC_NEEDS_MARK    = 1 << 7;
        /// GC bookkeeping, not named in spec.md's flag list but required
        /// by the mark-sweep cycle it describes in §4.2.
        const MARKED             = 1 << 8;
    }
}

/// `LINK`/`MISC`: "either a raw pointer or a node pointer the GC must
/// trace" (`spec.md` §3.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    None,
    Raw(usize),
    Node(NodeId),
}

/// What a series actually stores. Arrays hold cells; strings hold UTF-8
/// bytes with a codepoint-count cache; binaries hold raw bytes
/// (`spec.md` §3.4).
#[derive(Debug, Clone)]
pub enum SeriesData {
    Array(Vec<Cell>),
    /// UTF-8 text. `bookmark` caches the last `(codepoint_index,
    /// byte_index)` pair visited, making sequential indexed access O(1)
    /// amortized (`spec.md` §3.4).
    Utf8String { bytes: Vec<u8>, bookmark: std::cell::Cell<(usize, usize)> },
    Binary(Vec<u8>),
    /// `map!`: insertion-ordered so `words-of`/mold produce stable output.
    Map(Vec<(Cell, Cell)>),
    /// `handle!` companion node: an opaque id plus the cleaner that will
    /// run at sweep time. Cleaners must not allocate (`spec.md` §4.2, §9).
    Handle { opaque: usize },
    /// Depth >= 4 quoting, the node form `spec.md` §3.3 describes for
    /// escapes beyond the in-cell trick.
    Quoted { depth: u32, inner: Cell },
    /// An object/module/frame's immutable, shared key array
    /// (`spec.md` §3.6).
    Keylist(Vec<KeyEntry>),
    /// An action's parameter spec array, one entry per argument in
    /// declaration order (`spec.md` §3.7).
    Paramlist(Vec<ParamSpec>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            SeriesData::Array(v) => v.len(),
            SeriesData::Utf8String { bytes, .. } => {
                std::str::from_utf8(bytes).map(|s| s.chars().count()).unwrap_or(bytes.len())
            }
            SeriesData::Binary(v) => v.len(),
            SeriesData::Map(v) => v.len(),
            SeriesData::Handle { .. } => 0,
            SeriesData::Quoted { .. } => 1,
            SeriesData::Keylist(v) => v.len(),
            SeriesData::Paramlist(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One GC-managed allocation (`spec.md` §3.4's "series (node)").
#[derive(Debug, Clone)]
pub struct Node {
    pub flags: SeriesFlags,
    pub link: Slot,
    pub misc: Slot,
    pub data: SeriesData,
    /// Back-reference to the keylist, for contexts only (`spec.md` §3.6).
    /// A weak/back reference: traced for GC but not a lifetime root.
    pub keylist: Option<NodeId>,
}

impl Node {
    fn new(data: SeriesData) -> Node {
        Node {
            flags: SeriesFlags::empty(),
            link: Slot::None,
            misc: Slot::None,
            data,
            keylist: None,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.flags.contains(SeriesFlags::MANAGED)
    }

    pub fn is_protected(&self) -> bool {
        self.flags.contains(SeriesFlags::PROTECTED) || self.flags.contains(SeriesFlags::FROZEN_DEEP)
    }
}

/// The process's series pool. Allocation is a free-list over a flat
/// `Vec<Option<Node>>`; a freed slot's index is recycled by the next
/// `alloc_unmanaged` call, the same "reuse the back-array slot" shape the
/// teacher's `TaggedStack::grow` uses for its geometric resize, adapted
/// here to per-element rather than bulk reuse since nodes die
/// individually under mark-sweep (not in bulk, the way a stack frame
/// drops).
pub struct SeriesPool {
    nodes: Vec<Option<Node>>,
    free: Vec<u32>,
    /// Unmanaged nodes a creator still owns. `manage()` removes a node
    /// from this set; anything left here when the GC runs without also
    /// being on the `guarded` list is a leak bug in debug builds
    /// (`spec.md` §3.4, §4.2).
    unmanaged: HashSet<u32>,
    /// Unmanaged-but-rooted nodes (the "manual-tracking list of
    /// unmanaged-but-guarded series" root set from `spec.md` §4.2).
    guarded: HashSet<u32>,
}

impl SeriesPool {
    pub fn new() -> SeriesPool {
        SeriesPool {
            nodes: Vec::new(),
            free: Vec::new(),
            unmanaged: HashSet::new(),
            guarded: HashSet::new(),
        }
    }

    fn alloc_raw(&mut self, data: SeriesData) -> NodeId {
        let node = Node::new(data);
        let id = if let Some(slot) = self.free.pop() {
            self.nodes[slot as usize] = Some(node);
            slot
        } else {
            self.nodes.push(Some(node));
            (self.nodes.len() - 1) as u32
        };
        self.unmanaged.insert(id);
        NodeId(id)
    }

    /// Allocate a series the caller owns until it calls [`Self::manage`]
    /// or drops it via [`Self::free_unmanaged`] (`spec.md` §3.4's
    /// lifecycle paragraph).
    pub fn alloc_unmanaged(&mut self, data: SeriesData) -> NodeId {
        self.alloc_raw(data)
    }

    /// Hand a series to the GC. From then on, any cell referencing it
    /// keeps it alive; it is no longer this caller's responsibility to
    /// free.
    pub fn manage(&mut self, id: NodeId) {
        self.unmanaged.remove(&id.0);
        self.guarded.remove(&id.0);
        if let Some(node) = self.get_mut(id) {
            node.flags.insert(SeriesFlags::MANAGED);
        }
    }

    pub fn is_managed(&self, id: NodeId) -> bool {
        self.get(id).map(Node::is_managed).unwrap_or(false)
    }

    /// Root an unmanaged series so the GC does not consider it leaked
    /// while it is being built up piece by piece (`spec.md` §4.2's
    /// "Recycle is never triggered during a cell's partial construction"
    /// invariant, enforced here by giving builders an explicit way to
    /// hold a GC checkpoint off).
    pub fn guard(&mut self, id: NodeId) {
        self.guarded.insert(id.0);
    }

    pub fn unguard(&mut self, id: NodeId) {
        self.guarded.remove(&id.0);
    }

    /// Free an unmanaged series explicitly (its creator decided it is no
    /// longer needed, without ever publishing it to the GC).
    pub fn free_unmanaged(&mut self, id: NodeId) {
        if self.unmanaged.remove(&id.0) {
            self.guarded.remove(&id.0);
            self.nodes[id.0 as usize] = None;
            self.free.push(id.0);
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(|n| n.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).and_then(|n| n.as_mut())
    }

    /// Unmanaged nodes nobody guards: a leak, debug-build-detectable per
    /// `spec.md` §3.4.
    pub fn leaked_unmanaged(&self) -> Vec<NodeId> {
        self.unmanaged
            .iter()
            .filter(|id| !self.guarded.contains(id))
            .map(|&id| NodeId(id))
            .collect()
    }

    pub(crate) fn all_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| NodeId(i as u32)))
    }

    pub(crate) fn guarded_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.guarded.iter().map(|&id| NodeId(id))
    }

    pub(crate) fn sweep_unmarked(&mut self, mark_bit: SeriesFlags) -> Vec<(NodeId, Node)> {
        let mut freed = Vec::new();
        for i in 0..self.nodes.len() {
            let should_free = matches!(
                &self.nodes[i],
                Some(n) if n.is_managed() && !n.flags.contains(mark_bit)
            );
            if should_free {
                if let Some(node) = self.nodes[i].take() {
                    freed.push((NodeId(i as u32), node));
                }
                self.free.push(i as u32);
            }
        }
        freed
    }

    pub(crate) fn clear_marks(&mut self, mark_bit: SeriesFlags) {
        for node in self.nodes.iter_mut().flatten() {
            node.flags.remove(mark_bit);
        }
    }
}

impl Default for SeriesPool {
    fn default() -> Self {
        Self::new()
    }
}

/// `AS`: alias the same backing node under a different kind, sharing the
/// bytes (`spec.md` §3.4's "Ownership and aliasing"). Locks the source so
/// mutation through either view stays consistent, since this pool does
/// not implement copy-on-write.
pub fn alias_auto_lock(pool: &mut SeriesPool, id: NodeId) {
    if let Some(node) = pool.get_mut(id) {
        node.flags.insert(SeriesFlags::AUTO_LOCKED);
        node.flags.insert(SeriesFlags::PROTECTED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmanaged_series_without_a_guard_is_reported_leaked() {
        let mut pool = SeriesPool::new();
        let id = pool.alloc_unmanaged(SeriesData::Array(vec![]));
        assert_eq!(pool.leaked_unmanaged(), vec![id]);
        pool.guard(id);
        assert!(pool.leaked_unmanaged().is_empty());
        pool.manage(id);
        assert!(pool.leaked_unmanaged().is_empty());
        assert!(pool.is_managed(id));
    }

    #[test]
    fn freed_slots_are_recycled() {
        let mut pool = SeriesPool::new();
        let a = pool.alloc_unmanaged(SeriesData::Array(vec![]));
        pool.free_unmanaged(a);
        let b = pool.alloc_unmanaged(SeriesData::Array(vec![]));
        assert_eq!(a, b);
    }

    #[test]
    fn protected_series_rejects_mutation_by_flag() {
        let mut pool = SeriesPool::new();
        let id = pool.alloc_unmanaged(SeriesData::Array(vec![]));
        alias_auto_lock(&mut pool, id);
        assert!(pool.get(id).unwrap().is_protected());
    }
}
