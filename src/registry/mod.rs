//! Root Registry
//!
//! Keyed collection of the interactive roots currently known on the page.
//!
//! Entries are keyed by [`RootId`] (server sequence, or webassembly creation
//! id) and indexed by their permanent start anchor, so a server re-render that
//! changes a root's sequence still merges into the entry it already owns.
//! The registry also owns the [`DescriptorIds`] allocator and the one-shot
//! auto mode decision.

mod mode;

pub use mode::{AutoHints, AutoPolicy, AutoResolver, RenderMode};

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::descriptor::{
    ComponentDescriptor, ComponentKind, DescriptorIds, MergeError, RootId, WireRecord,
};
use crate::dom::{Dom, NodeId};
use crate::marker::{ScanError, discover_all};
use mode::AutoDecision;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("root {id}: {source}")]
    Merge {
        id: RootId,
        #[source]
        source: MergeError,
    },
}

/// One registered root.
#[derive(Debug, Clone)]
pub struct RootEntry {
    pub descriptor: ComponentDescriptor,
    /// Handed to the renderer already.
    pub activated: bool,
}

/// How `register` placed a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted(RootId),
    /// Merged into an existing entry, now keyed by this id.
    Merged(RootId),
}

impl Registration {
    pub const fn id(self) -> RootId {
        match self {
            Self::Inserted(id) | Self::Merged(id) => id,
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: Vec<RootId>,
    pub merged: Vec<RootId>,
    pub pruned: Vec<RootId>,
    /// Unseen roots dropped because insertions were paused.
    pub skipped: Vec<RootId>,
}

impl ReconcileReport {
    pub fn is_unchanged(&self) -> bool {
        self.inserted.is_empty() && self.pruned.is_empty()
    }
}

pub struct RootRegistry {
    entries: FxHashMap<RootId, RootEntry>,
    anchors: FxHashMap<NodeId, RootId>,
    ids: DescriptorIds,
    auto: AutoDecision,
}

impl Default for RootRegistry {
    fn default() -> Self {
        Self::new(AutoPolicy::default())
    }
}

impl RootRegistry {
    pub fn new(policy: AutoPolicy) -> Self {
        Self::with_resolver(policy.into_resolver())
    }

    pub fn with_resolver(resolver: AutoResolver) -> Self {
        Self {
            entries: FxHashMap::default(),
            anchors: FxHashMap::default(),
            ids: DescriptorIds::new(),
            auto: AutoDecision::new(resolver),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Insert `descriptor`, or merge it into the entry it belongs to.
    ///
    /// Lookup is by identity first, then by start anchor. An anchor match
    /// re-keys the entry under the incoming identity.
    pub fn register(
        &mut self,
        descriptor: ComponentDescriptor,
    ) -> Result<Registration, RegistryError> {
        let id = descriptor.id();
        let existing = if self.entries.contains_key(&id) {
            Some(id)
        } else {
            self.anchors.get(&descriptor.start()).copied()
        };

        let Some(existing) = existing else {
            self.anchors.insert(descriptor.start(), id);
            self.entries.insert(
                id,
                RootEntry {
                    descriptor,
                    activated: false,
                },
            );
            crate::debug!("registry"; "inserted {}", id);
            return Ok(Registration::Inserted(id));
        };

        let Some(mut entry) = self.entries.remove(&existing) else {
            // Stale anchor index; treat as fresh
            self.anchors.remove(&descriptor.start());
            return self.register(descriptor);
        };
        if let Err(source) = entry.descriptor.merge(descriptor) {
            self.entries.insert(existing, entry);
            return Err(RegistryError::Merge {
                id: existing,
                source,
            });
        }

        let merged = entry.descriptor.id();
        self.anchors.insert(entry.descriptor.start(), merged);
        self.entries.insert(merged, entry);
        if merged != existing {
            crate::debug!("registry"; "merged {} (re-keyed from {})", merged, existing);
        } else {
            crate::debug!("registry"; "merged {}", merged);
        }
        Ok(Registration::Merged(merged))
    }

    /// Drop an entry's bookkeeping. Started runtimes are not affected.
    pub fn prune(&mut self, id: RootId) -> Option<ComponentDescriptor> {
        let entry = self.entries.remove(&id)?;
        let start = entry.descriptor.start();
        if self.anchors.get(&start) == Some(&id) {
            self.anchors.remove(&start);
        }
        if id.kind() == ComponentKind::WebAssembly {
            self.ids.release(start);
        }
        crate::debug!("registry"; "pruned {}", id);
        Some(entry.descriptor)
    }

    /// Re-scan `root` for both kinds and bring the registry in line with it.
    pub fn reconcile(
        &mut self,
        dom: &Dom,
        root: NodeId,
        allow_insertions: bool,
    ) -> Result<ReconcileReport, RegistryError> {
        let discovered = discover_all(dom, root, false, &mut self.ids)?;
        let mut report = ReconcileReport::default();
        let mut seen = FxHashSet::default();

        for descriptor in discovered {
            if !allow_insertions && !self.owns(&descriptor) {
                crate::debug!("registry"; "insertions paused, skipping {}", descriptor.id());
                if descriptor.id().kind() == ComponentKind::WebAssembly {
                    self.ids.release(descriptor.start());
                }
                report.skipped.push(descriptor.id());
                continue;
            }
            match self.register(descriptor)? {
                Registration::Inserted(id) => {
                    seen.insert(id);
                    report.inserted.push(id);
                }
                Registration::Merged(id) => {
                    seen.insert(id);
                    report.merged.push(id);
                }
            }
        }

        let mut stale: Vec<RootId> = self
            .entries
            .iter()
            .filter(|(id, entry)| !seen.contains(*id) && !dom.contains(root, entry.descriptor.start()))
            .map(|(id, _)| *id)
            .collect();
        stale.sort();
        for id in stale {
            self.prune(id);
            report.pruned.push(id);
        }

        crate::debug!(
            "registry";
            "reconciled {}: +{} ~{} -{}",
            root,
            report.inserted.len(),
            report.merged.len(),
            report.pruned.len()
        );
        Ok(report)
    }

    /// Would `descriptor` merge into an existing entry?
    fn owns(&self, descriptor: &ComponentDescriptor) -> bool {
        self.entries.contains_key(&descriptor.id()) || self.anchors.contains_key(&descriptor.start())
    }

    // =========================================================================
    // Mode decision
    // =========================================================================

    /// Map a requested mode to the runtime that serves it.
    pub fn decide_mode(&mut self, mode: RenderMode, hints: &AutoHints) -> ComponentKind {
        match mode {
            RenderMode::Server => ComponentKind::Server,
            RenderMode::WebAssembly => ComponentKind::WebAssembly,
            RenderMode::Auto => self.auto.resolve(hints),
        }
    }

    /// Replace the auto resolver. Returns `false` (and does nothing) once the
    /// auto decision has been made.
    pub fn set_auto_resolver(&mut self, resolver: AutoResolver) -> bool {
        self.auto.replace(resolver)
    }

    pub fn auto_decision(&self) -> Option<ComponentKind> {
        self.auto.decided()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, id: RootId) -> Option<&RootEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids_mut(&mut self) -> &mut DescriptorIds {
        &mut self.ids
    }

    /// Descriptors of `kind`, sorted by ordering key.
    pub fn snapshot(&self, kind: ComponentKind) -> Vec<ComponentDescriptor> {
        let mut out: Vec<ComponentDescriptor> = self
            .entries
            .values()
            .filter(|entry| entry.descriptor.kind() == kind)
            .map(|entry| entry.descriptor.clone())
            .collect();
        out.sort_by_key(ComponentDescriptor::id);
        out
    }

    pub fn records(&self, kind: ComponentKind) -> Vec<WireRecord> {
        self.snapshot(kind)
            .iter()
            .map(ComponentDescriptor::to_record)
            .collect()
    }

    /// Not-yet-activated roots of `kind`, in ordering-key order.
    pub fn pending_activation(&self, kind: ComponentKind) -> Vec<RootId> {
        let mut out: Vec<RootId> = self
            .entries
            .iter()
            .filter(|(id, entry)| id.kind() == kind && !entry.activated)
            .map(|(id, _)| *id)
            .collect();
        out.sort();
        out
    }

    /// Mark a root as activated. Returns `true` on the first call only.
    pub fn mark_activated(&mut self, id: RootId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) if !entry.activated => {
                entry.activated = true;
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for RootRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootRegistry")
            .field("entries", &self.entries.len())
            .field("auto", &self.auto)
            .finish()
    }
}
