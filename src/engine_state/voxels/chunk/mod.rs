//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed-size column of voxels
//! `width × height × width` in size, together with the instance batches that
//! describe which of its voxels are drawn.
//!
//! ## Storage
//!
//! Voxels live in one flat `Vec<VoxelRecord>` in x-fastest order:
//!
//! ```text
//! index = width * height * z + width * y + x
//! ```
//!
//! Every lookup is bounds-checked. Reads outside the chunk return `None` and
//! writes outside the chunk are ignored, which lets generation passes
//! (canopies in particular) spill over the border without special cases.
//!
//! ## Rendering
//!
//! A voxel is only worth drawing if at least one of its six neighbors is
//! empty or outside the chunk. Each visible voxel owns one slot in the batch
//! of its block id, and the chunk queues a
//! [`RenderCommand`](super::render_command::RenderCommand) for every slot it
//! writes so the renderer can mirror the batches on the GPU.

use cgmath::Point3;
use log::debug;

use self::instance_batch::{InstanceBatch, SlotRemoval};
use super::block::block_side::BlockSide;
use super::block::block_type::BlockId;
use super::block::VoxelRecord;
use super::data_store::{DataStore, EditKey};
use super::params::{ChunkSize, GenerationParams};
use super::render_command::RenderCommand;
use crate::core::StResource;

mod chunk_generation;
pub mod instance_batch;

/// Position of a chunk on the horizontal chunk grid.
///
/// Chunk `(x, z)` covers world columns `[x * width, (x + 1) * width)` and
/// `[z * width, (z + 1) * width)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World position of this chunk's `(0, 0, 0)` voxel.
    pub fn origin(&self, size: ChunkSize) -> Point3<i32> {
        Point3::new(self.x * size.width, 0, self.z * size.width)
    }
}

/// A fixed-size block of voxels and its render instance batches.
pub struct Chunk {
    coord: ChunkCoord,
    size: ChunkSize,
    origin: Point3<i32>,
    params: StResource<GenerationParams>,
    data_store: StResource<DataStore>,
    voxels: Vec<VoxelRecord>,
    /// One batch per block id, indexed by discriminant. The `Empty` batch stays unused.
    batches: Vec<InstanceBatch>,
    loaded: bool,
    disposed: bool,
    pending_commands: Vec<RenderCommand>,
}

impl Chunk {
    /// Creates an all-empty, unloaded chunk.
    ///
    /// The chunk size is captured from `params` now; a later change of chunk
    /// size only takes effect on chunks created after it.
    ///
    /// # Arguments
    /// * `coord` - Grid position of the chunk
    /// * `params` - Generation parameters shared with the world
    /// * `data_store` - Player edit overlay shared with the world
    pub fn new(
        coord: ChunkCoord,
        params: StResource<GenerationParams>,
        data_store: StResource<DataStore>,
    ) -> Self {
        let size = params.get().chunk;
        let volume = size.volume();

        Self {
            coord,
            size,
            origin: coord.origin(size),
            params,
            data_store,
            voxels: vec![VoxelRecord::default(); volume],
            batches: (0..BlockId::COUNT)
                .map(|_| InstanceBatch::new(volume))
                .collect(),
            loaded: false,
            disposed: false,
            pending_commands: Vec::new(),
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn origin(&self) -> Point3<i32> {
        self.origin
    }

    pub fn size(&self) -> ChunkSize {
        self.size
    }

    /// Whether generation has completed and the chunk may be edited.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        (0..self.size.width).contains(&x)
            && (0..self.size.height).contains(&y)
            && (0..self.size.width).contains(&z)
    }

    /// Maps a local coordinate to its storage index.
    ///
    /// # Returns
    /// `None` if the coordinate lies outside the chunk.
    pub fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        if !self.in_bounds(x, y, z) {
            return None;
        }
        let w = self.size.width;
        let h = self.size.height;
        Some((w * h * z + w * y + x) as usize)
    }

    /// Inverse of [`Chunk::index`].
    pub fn coords_of(&self, index: usize) -> Point3<i32> {
        let w = self.size.width as usize;
        let h = self.size.height as usize;
        Point3::new(
            (index % w) as i32,
            ((index / w) % h) as i32,
            (index / (w * h)) as i32,
        )
    }

    /// Returns the voxel at a local coordinate, or `None` outside the chunk.
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&VoxelRecord> {
        self.index(x, y, z).map(|index| &self.voxels[index])
    }

    fn get_mut(&mut self, x: i32, y: i32, z: i32) -> Option<&mut VoxelRecord> {
        let index = self.index(x, y, z)?;
        Some(&mut self.voxels[index])
    }

    /// Overwrites the block id at a local coordinate. Out-of-bounds writes are ignored.
    ///
    /// This does not touch instance batches; callers that change a rendered
    /// voxel go through [`Chunk::add_block`] or [`Chunk::remove_block`].
    pub fn set_block_id(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        if let Some(voxel) = self.get_mut(x, y, z) {
            voxel.id = id;
        }
    }

    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        matches!(self.get(x, y, z), Some(voxel) if !voxel.is_empty())
    }

    /// A voxel is obscured when it is non-empty and all six neighbors are
    /// non-empty voxels of this chunk. Neighbors across the chunk border count
    /// as open.
    pub fn is_obscured(&self, x: i32, y: i32, z: i32) -> bool {
        if !self.is_solid(x, y, z) {
            return false;
        }
        BlockSide::neighbor_offsets()
            .iter()
            .all(|offset| self.is_solid(x + offset.x, y + offset.y, z + offset.z))
    }

    /// The instance batch for a block id.
    pub fn batch(&self, id: BlockId) -> &InstanceBatch {
        &self.batches[id as usize]
    }

    /// Iterates the world positions of every live instance of `id`, in slot order.
    pub fn instance_positions(&self, id: BlockId) -> impl Iterator<Item = Point3<i32>> + '_ {
        let origin = self.origin;
        self.batch(id)
            .positions()
            .iter()
            .map(move |local| Point3::new(origin.x + local.x, origin.y + local.y, origin.z + local.z))
    }

    /// Runs every generation pass, builds the instance batches and marks the
    /// chunk loaded. Does nothing on a disposed chunk.
    pub fn generate(&mut self) {
        if self.disposed {
            return;
        }

        let params = self.params.clone();
        let params = params.get();
        self.run_generation_passes(&params);
        self.load_player_changes();
        self.build_instances();
        self.loaded = true;

        debug!(
            "Generated chunk ({}, {}): {} visible instances",
            self.coord.x,
            self.coord.z,
            self.batches.iter().map(InstanceBatch::count).sum::<u32>()
        );
    }

    /// Replays the overlay edits recorded for this chunk's origin.
    fn load_player_changes(&mut self) {
        let edits: Vec<_> = self
            .data_store
            .get()
            .edits_for_chunk(self.origin.x, self.origin.z)
            .collect();
        for (x, y, z, id) in edits {
            self.set_block_id(x, y, z, id);
        }
    }

    /// Rebuilds every batch from scratch: one slot per non-empty, non-obscured voxel.
    pub fn build_instances(&mut self) {
        for batch in &mut self.batches {
            batch.clear();
        }

        for index in 0..self.voxels.len() {
            let position = self.coords_of(index);
            let visible = !self.is_obscured(position.x, position.y, position.z);
            let voxel = self.voxels[index];

            let slot = if !voxel.is_empty() && visible {
                self.batches[voxel.id as usize].push(position)
            } else {
                None
            };
            self.voxels[index].instance_slot = slot;
        }

        self.pending_commands
            .push(RenderCommand::UploadChunk { chunk: self.coord });
    }

    /// Gives a voxel a render slot if it is non-empty and has none yet.
    pub fn add_block_instance(&mut self, x: i32, y: i32, z: i32) {
        let Some(voxel) = self.get(x, y, z).copied() else {
            return;
        };
        if voxel.is_empty() || voxel.instance_slot.is_some() {
            return;
        }

        let position = Point3::new(x, y, z);
        let Some(slot) = self.batches[voxel.id as usize].push(position) else {
            return;
        };
        if let Some(voxel) = self.get_mut(x, y, z) {
            voxel.instance_slot = Some(slot);
        }

        self.queue_slot_write(voxel.id, slot, position);
        self.queue_count(voxel.id);
    }

    /// Frees a voxel's render slot, moving the batch's last instance into it.
    pub fn remove_block_instance(&mut self, x: i32, y: i32, z: i32) {
        let Some(voxel) = self.get(x, y, z).copied() else {
            return;
        };
        let Some(slot) = voxel.instance_slot else {
            return;
        };
        if voxel.is_empty() {
            return;
        }

        let removal = self.batches[voxel.id as usize].swap_remove(slot);
        if let Some(voxel) = self.get_mut(x, y, z) {
            voxel.instance_slot = None;
        }

        if let Some(SlotRemoval::Moved { position, .. }) = removal {
            if let Some(moved) = self.get_mut(position.x, position.y, position.z) {
                moved.instance_slot = Some(slot);
            }
            self.queue_slot_write(voxel.id, slot, position);
        }
        self.queue_count(voxel.id);
    }

    /// Places a block and records the edit in the overlay.
    ///
    /// # Returns
    /// `false` (and nothing changes) if the target is out of bounds or already occupied.
    pub fn add_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        if id.is_empty() {
            return false;
        }
        match self.get(x, y, z) {
            Some(voxel) if voxel.is_empty() => {}
            _ => return false,
        }

        self.set_block_id(x, y, z, id);
        self.add_block_instance(x, y, z);
        self.record_edit(x, y, z, id);
        true
    }

    /// Clears a block and records the removal in the overlay.
    ///
    /// # Returns
    /// `false` (and nothing changes) if the target is out of bounds or already empty.
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> bool {
        match self.get(x, y, z) {
            Some(voxel) if !voxel.is_empty() => {}
            _ => return false,
        }

        self.remove_block_instance(x, y, z);
        self.set_block_id(x, y, z, BlockId::Empty);
        self.record_edit(x, y, z, BlockId::Empty);
        true
    }

    /// Drops the voxel's render slot if its neighbors now cover it completely.
    pub fn hide_if_obscured(&mut self, x: i32, y: i32, z: i32) {
        if self.is_obscured(x, y, z) {
            self.remove_block_instance(x, y, z);
        }
    }

    fn record_edit(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        self.data_store
            .get_mut()
            .set(EditKey::new(self.origin.x, self.origin.z, x, y, z), id);
    }

    fn queue_slot_write(&mut self, block: BlockId, slot: u32, local: Point3<i32>) {
        self.pending_commands.push(RenderCommand::WriteInstance {
            chunk: self.coord,
            block,
            slot,
            position: Point3::new(
                self.origin.x + local.x,
                self.origin.y + local.y,
                self.origin.z + local.z,
            ),
        });
    }

    fn queue_count(&mut self, block: BlockId) {
        let count = self.batch(block).count();
        self.pending_commands.push(RenderCommand::SetInstanceCount {
            chunk: self.coord,
            block,
            count,
        });
    }

    /// Takes every render command queued since the last drain.
    pub fn drain_render_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.pending_commands)
    }

    /// Empties the chunk's batches. A disposed chunk never generates again.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.loaded = false;
        for batch in &mut self.batches {
            batch.clear();
        }
        for voxel in &mut self.voxels {
            voxel.instance_slot = None;
        }
        self.pending_commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::random::Random;

    fn test_chunk(width: i32, height: i32) -> Chunk {
        let params = GenerationParams {
            chunk: ChunkSize { width, height },
            ..GenerationParams::default()
        };
        Chunk::new(
            ChunkCoord::new(0, 0),
            StResource::new(params),
            StResource::new(DataStore::new()),
        )
    }

    /// Fills the chunk solid with stone and builds its batches.
    fn solid_chunk(width: i32, height: i32) -> Chunk {
        let mut chunk = test_chunk(width, height);
        for index in 0..chunk.voxels.len() {
            chunk.voxels[index].id = BlockId::Stone;
        }
        chunk.build_instances();
        chunk.drain_render_commands();
        chunk
    }

    /// Every live slot points back at a voxel that records that slot, and
    /// every voxel slot is live in its batch.
    fn assert_batches_consistent(chunk: &Chunk) {
        for id in BlockId::RENDERABLE {
            for (slot, position) in chunk.batch(id).positions().iter().enumerate() {
                let voxel = chunk.get(position.x, position.y, position.z).unwrap();
                assert_eq!(voxel.id, id);
                assert_eq!(voxel.instance_slot, Some(slot as u32));
            }
        }
        for index in 0..chunk.voxels.len() {
            let voxel = chunk.voxels[index];
            if let Some(slot) = voxel.instance_slot {
                assert_eq!(
                    chunk.batch(voxel.id).get(slot),
                    Some(chunk.coords_of(index))
                );
            }
        }
        for id in BlockId::RENDERABLE {
            let slotted = chunk
                .voxels
                .iter()
                .filter(|voxel| voxel.id == id && voxel.instance_slot.is_some())
                .count();
            assert_eq!(slotted as u32, chunk.batch(id).count(), "{id} slots are not dense");
        }
    }

    #[test]
    fn random_edit_sequences_keep_slots_dense_and_mirrored() {
        let mut chunk = test_chunk(4, 4);
        let mut rng = Random::new(2024);
        let mut mirror: Vec<Vec<Point3<i32>>> = vec![Vec::new(); BlockId::COUNT];
        let roll = |rng: &mut Random, n: usize| (rng.next() * n as f64) as usize;

        for step in 0..5000 {
            let x = roll(&mut rng, 4) as i32;
            let y = roll(&mut rng, 4) as i32;
            let z = roll(&mut rng, 4) as i32;
            match roll(&mut rng, 4) {
                0 => {
                    let id = BlockId::RENDERABLE[roll(&mut rng, BlockId::RENDERABLE.len())];
                    chunk.add_block(x, y, z, id);
                }
                1 => {
                    chunk.remove_block(x, y, z);
                }
                2 => chunk.add_block_instance(x, y, z),
                _ => chunk.remove_block_instance(x, y, z),
            }

            for command in chunk.drain_render_commands() {
                match command {
                    RenderCommand::WriteInstance {
                        block,
                        slot,
                        position,
                        ..
                    } => {
                        let batch = &mut mirror[block as usize];
                        let slot = slot as usize;
                        if slot >= batch.len() {
                            batch.resize(slot + 1, position);
                        }
                        batch[slot] = position;
                    }
                    RenderCommand::SetInstanceCount { block, count, .. } => {
                        mirror[block as usize].truncate(count as usize);
                    }
                    other => panic!("unexpected {other:?} at step {step}"),
                }
            }

            assert_batches_consistent(&chunk);
            for id in BlockId::RENDERABLE {
                assert_eq!(
                    mirror[id as usize].as_slice(),
                    chunk.batch(id).positions(),
                    "{id} mirror diverged at step {step}"
                );
            }
        }
    }

    #[test]
    fn index_math_round_trips() {
        let chunk = test_chunk(4, 3);

        assert_eq!(chunk.index(1, 2, 3), Some(4 * 3 * 3 + 4 * 2 + 1));
        for index in 0..chunk.voxels.len() {
            let p = chunk.coords_of(index);
            assert_eq!(chunk.index(p.x, p.y, p.z), Some(index));
        }
    }

    #[test]
    fn out_of_bounds_reads_and_writes_are_ignored() {
        let mut chunk = test_chunk(4, 4);

        assert!(chunk.get(-1, 0, 0).is_none());
        assert!(chunk.get(0, 4, 0).is_none());
        chunk.set_block_id(4, 0, 0, BlockId::Dirt);
        chunk.set_block_id(0, 0, -1, BlockId::Dirt);

        assert!(chunk.voxels.iter().all(VoxelRecord::is_empty));
    }

    #[test]
    fn only_fully_enclosed_voxels_are_obscured() {
        let chunk = solid_chunk(3, 3);

        assert!(chunk.is_obscured(1, 1, 1));
        assert!(!chunk.is_obscured(0, 1, 1), "border neighbors count as open");
        assert!(!test_chunk(3, 3).is_obscured(1, 1, 1), "empty voxels are never obscured");
    }

    #[test]
    fn build_instances_skips_obscured_voxels() {
        let chunk = solid_chunk(3, 3);

        assert_eq!(chunk.batch(BlockId::Stone).count(), 26);
        assert_eq!(chunk.get(1, 1, 1).unwrap().instance_slot, None);
        assert_batches_consistent(&chunk);
    }

    #[test]
    fn removing_a_block_reuses_its_slot_for_the_last_instance() {
        let mut chunk = solid_chunk(3, 3);
        let removed_slot = chunk.get(0, 0, 0).unwrap().instance_slot.unwrap();
        let last_slot = chunk.batch(BlockId::Stone).count() - 1;
        let last = chunk.batch(BlockId::Stone).get(last_slot).unwrap();

        assert!(chunk.remove_block(0, 0, 0));

        assert_eq!(chunk.batch(BlockId::Stone).count(), 25);
        assert_eq!(chunk.get(0, 0, 0).unwrap().id, BlockId::Empty);
        assert_eq!(chunk.get(0, 0, 0).unwrap().instance_slot, None);
        assert_eq!(
            chunk.get(last.x, last.y, last.z).unwrap().instance_slot,
            Some(removed_slot)
        );
        assert_batches_consistent(&chunk);

        let commands = chunk.drain_render_commands();
        assert!(commands.contains(&RenderCommand::WriteInstance {
            chunk: ChunkCoord::new(0, 0),
            block: BlockId::Stone,
            slot: removed_slot,
            position: last,
        }));
        assert_eq!(
            commands.last(),
            Some(&RenderCommand::SetInstanceCount {
                chunk: ChunkCoord::new(0, 0),
                block: BlockId::Stone,
                count: 25,
            })
        );
    }

    #[test]
    fn add_and_remove_record_overlay_entries() {
        let mut chunk = test_chunk(4, 4);
        let overlay = chunk.data_store.clone();

        assert!(chunk.add_block(1, 1, 1, BlockId::Sand));
        assert!(!chunk.add_block(1, 1, 1, BlockId::Stone), "occupied target");
        assert_eq!(chunk.get(1, 1, 1).unwrap().id, BlockId::Sand);
        assert_eq!(overlay.get().get(&EditKey::new(0, 0, 1, 1, 1)), Some(BlockId::Sand));

        assert!(chunk.remove_block(1, 1, 1));
        assert!(!chunk.remove_block(1, 1, 1), "already empty");
        assert_eq!(overlay.get().get(&EditKey::new(0, 0, 1, 1, 1)), Some(BlockId::Empty));
        assert_eq!(chunk.batch(BlockId::Sand).count(), 0);
    }

    #[test]
    fn edits_outside_the_chunk_change_nothing() {
        let mut chunk = test_chunk(4, 4);

        assert!(!chunk.add_block(4, 0, 0, BlockId::Dirt));
        assert!(!chunk.remove_block(-1, 0, 0));
        assert!(chunk.data_store.get().is_empty());
        assert!(chunk.drain_render_commands().is_empty());
    }

    #[test]
    fn disposed_chunks_do_not_generate() {
        let mut chunk = test_chunk(4, 4);

        chunk.dispose();
        chunk.generate();

        assert!(!chunk.is_loaded());
        assert!(chunk.drain_render_commands().is_empty());
    }
}
