//! Creation-order ids for webassembly descriptors.

use rustc_hash::FxHashMap;

use crate::dom::NodeId;

/// Monotonic id allocator owned by whoever creates descriptors (the registry).
///
/// Ids are keyed by start anchor: the first scan that meets an anchor assigns
/// the next id, later scans of the same anchor get the same id back. Re-scans
/// therefore preserve both identity and creation order.
#[derive(Debug, Default)]
pub struct DescriptorIds {
    next: u64,
    by_anchor: FxHashMap<NodeId, u64>,
}

impl DescriptorIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for the descriptor anchored at `start`.
    pub fn assign(&mut self, start: NodeId) -> u64 {
        *self.by_anchor.entry(start).or_insert_with(|| {
            let id = self.next;
            self.next += 1;
            id
        })
    }

    /// Forget an anchor whose descriptor was pruned.
    pub fn release(&mut self, start: NodeId) {
        self.by_anchor.remove(&start);
    }

    /// Number of anchors currently holding an id.
    pub fn tracked(&self) -> usize {
        self.by_anchor.len()
    }

    /// Number of ids handed out so far.
    pub const fn issued(&self) -> u64 {
        self.next
    }
}
