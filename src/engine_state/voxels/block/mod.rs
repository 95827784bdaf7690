//! # Block Module
//!
//! This module provides the block-related data for the voxel engine: the closed
//! set of block ids, the static block type table, block face offsets and the
//! per-voxel record stored in every chunk.

use block_type::BlockId;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block ids in memory.
pub type BlockIdSize = u8;

/// A single voxel as stored in a chunk.
///
/// # Invariant
/// A non-empty voxel that is not obscured by its six neighbors owns exactly
/// one slot in its block id's instance batch. Empty or obscured voxels own
/// none.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VoxelRecord {
    /// The material of this voxel.
    pub id: BlockId,
    /// Index into the instance batch of `id`, if the voxel is currently rendered.
    pub instance_slot: Option<u32>,
}

impl VoxelRecord {
    /// Creates an unrendered voxel of the given id.
    ///
    /// # Arguments
    /// * `id` - The block id to store
    ///
    /// # Returns
    /// A new `VoxelRecord` with no instance slot.
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            instance_slot: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}
