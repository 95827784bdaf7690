//! # Data Store
//!
//! The persistent change overlay: a sparse record of every voxel the player
//! has explicitly added or removed. Entries are keyed by the owning chunk's
//! world origin plus the chunk-local coordinate, so they outlive the chunk
//! that recorded them and are replayed on top of procedural content whenever
//! that chunk is generated again.
//!
//! A removal is stored as an explicit `BlockId::Empty` entry, which is what
//! lets a dug-out hole survive regeneration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::block::block_type::BlockId;

/// Identifies one voxel independently of any chunk instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditKey {
    /// World X of the owning chunk's origin.
    pub origin_x: i32,
    /// World Z of the owning chunk's origin.
    pub origin_z: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl EditKey {
    pub fn new(origin_x: i32, origin_z: i32, x: i32, y: i32, z: i32) -> Self {
        Self {
            origin_x,
            origin_z,
            x,
            y,
            z,
        }
    }
}

/// Serialized form of one overlay entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub origin_x: i32,
    pub origin_z: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub block: BlockId,
}

/// Sparse map of player edits, shared by the world and all of its chunks.
///
/// Serializes as a list of [`OverlayEntry`] values sorted by key, so a saved
/// overlay is stable across runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<OverlayEntry>", into = "Vec<OverlayEntry>")]
pub struct DataStore {
    data: HashMap<EditKey, BlockId>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every recorded edit.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn contains(&self, key: &EditKey) -> bool {
        self.data.contains_key(key)
    }

    pub fn get(&self, key: &EditKey) -> Option<BlockId> {
        self.data.get(key).copied()
    }

    /// Records an edit, replacing any earlier edit of the same voxel.
    pub fn set(&mut self, key: EditKey, block: BlockId) {
        self.data.insert(key, block);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates the edits recorded for the chunk whose origin is `(origin_x, origin_z)`.
    ///
    /// # Returns
    /// `(x, y, z, block)` tuples in chunk-local coordinates, in no particular order.
    pub fn edits_for_chunk(
        &self,
        origin_x: i32,
        origin_z: i32,
    ) -> impl Iterator<Item = (i32, i32, i32, BlockId)> + '_ {
        self.data
            .iter()
            .filter(move |(key, _)| key.origin_x == origin_x && key.origin_z == origin_z)
            .map(|(key, block)| (key.x, key.y, key.z, *block))
    }
}

impl From<Vec<OverlayEntry>> for DataStore {
    fn from(entries: Vec<OverlayEntry>) -> Self {
        let data = entries
            .into_iter()
            .map(|entry| {
                (
                    EditKey::new(entry.origin_x, entry.origin_z, entry.x, entry.y, entry.z),
                    entry.block,
                )
            })
            .collect();
        Self { data }
    }
}

impl From<DataStore> for Vec<OverlayEntry> {
    fn from(store: DataStore) -> Self {
        let mut entries: Vec<(EditKey, BlockId)> = store.data.into_iter().collect();
        entries.sort_unstable_by_key(|(key, _)| *key);
        entries
            .into_iter()
            .map(|(key, block)| OverlayEntry {
                origin_x: key.origin_x,
                origin_z: key.origin_z,
                x: key.x,
                y: key.y,
                z: key.z,
                block,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_edits_replace_earlier_ones() {
        let mut store = DataStore::new();
        let key = EditKey::new(16, -32, 1, 2, 3);

        store.set(key, BlockId::Stone);
        store.set(key, BlockId::Empty);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key), Some(BlockId::Empty));
        assert!(store.contains(&key));
    }

    #[test]
    fn edits_are_scoped_to_their_chunk_origin() {
        let mut store = DataStore::new();
        store.set(EditKey::new(0, 0, 1, 1, 1), BlockId::Dirt);
        store.set(EditKey::new(16, 0, 1, 1, 1), BlockId::Sand);
        store.set(EditKey::new(0, 0, 2, 2, 2), BlockId::Empty);

        let mut edits: Vec<_> = store.edits_for_chunk(0, 0).collect();
        edits.sort_by_key(|(x, y, z, _)| (*x, *y, *z));

        assert_eq!(
            edits,
            vec![(1, 1, 1, BlockId::Dirt), (2, 2, 2, BlockId::Empty)]
        );
    }

    #[test]
    fn serializes_as_sorted_entry_list() {
        let mut store = DataStore::new();
        store.set(EditKey::new(16, 0, 0, 0, 0), BlockId::Grass);
        store.set(EditKey::new(0, 0, 4, 1, 0), BlockId::Empty);

        let json = serde_json::to_value(&store).unwrap();
        let entries = json.as_array().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["origin_x"], 0);
        assert_eq!(entries[0]["block"], "empty");
        assert_eq!(entries[1]["block"], "grass");

        let parsed: DataStore = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, store);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut store = DataStore::new();
        store.set(EditKey::new(0, 0, 0, 0, 0), BlockId::Leaves);

        store.clear();

        assert!(store.is_empty());
    }
}
