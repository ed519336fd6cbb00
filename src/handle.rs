//! Handle pool & entity map.
//!
//! `slotmapd` already gives exactly the contract entity handles need: a
//! generational (index, generation) handle, O(1) allocation that reuses
//! freed rows, and O(1) `is_valid`/lookup. This mirrors how `flat_spatial`
//! defines its own per-grid handle types (`AABBGridHandle`, `GridHandle`)
//! via `slotmapd::new_key_type!` rather than hand-rolling a free-list.

use fnv::FnvHashMap;
use slotmapd::new_key_type;

new_key_type! {
    /// Generational handle into a [`crate::context::CollisionContext`]'s
    /// entity storage. Stale handles (freed, then reused under a new
    /// generation) are detected structurally by `slotmapd` rather than by
    /// a hand-written generation check.
    pub struct EntityHandle;
}

/// Caller-chosen external id, opaque to the engine.
pub type EntityId = u64;

/// Bidirectional-enough map from the caller's [`EntityId`] to the engine's
/// internal [`EntityHandle`] — every live id maps to exactly one handle.
#[derive(Default, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityMap {
    by_id: FnvHashMap<EntityId, EntityHandle>,
}

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId, handle: EntityHandle) {
        self.by_id.insert(id, handle);
    }

    pub fn find(&self, id: EntityId) -> Option<EntityHandle> {
        self.by_id.get(&id).copied()
    }

    pub fn remove(&mut self, id: EntityId) -> Option<EntityHandle> {
        self.by_id.remove(&id)
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
