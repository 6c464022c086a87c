use crate::inventory::{InventoryItem, InventorySnapshot, OwnerId};
use dashmap::DashMap;

/// Latest known inventory per owner, shared across all sessions.
///
/// An entry's presence is its validity: `put` replaces the whole snapshot in
/// one map operation and `invalidate` removes it, so readers never observe a
/// partially written entry and at most one snapshot exists per owner.
#[derive(Default)]
pub struct InventoryCache {
    entries: DashMap<OwnerId, InventorySnapshot>,
}

impl InventoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: &OwnerId) -> Option<InventorySnapshot> {
        self.entries.get(owner).map(|entry| entry.clone())
    }

    /// Replaces any existing snapshot for `owner` with a fresh one stamped
    /// with the current time, and returns it.
    pub fn put(&self, owner: OwnerId, items: Vec<InventoryItem>) -> InventorySnapshot {
        let snapshot = InventorySnapshot::new(owner.clone(), items);
        log::debug!("Caching {} items for {}", snapshot.items.len(), snapshot.owner);
        self.entries.insert(owner, snapshot.clone());
        snapshot
    }

    /// Removes the entry for `owner` if present. Invalidating an absent
    /// entry is a no-op.
    pub fn invalidate(&self, owner: &OwnerId) {
        self.entries.remove(owner);
    }
}
