//! # World Module
//!
//! This module provides the `World` struct which manages the set of live
//! chunks around the player. It is the single entry point for reading and
//! editing voxels in world coordinates.
//!
//! ## Architecture
//!
//! Chunks live in a sparse map keyed by their horizontal grid coordinate.
//! Only chunks within the draw distance of the player are kept; anything that
//! falls outside is disposed on the next update. The world owns the
//! generation parameters and the player edit overlay and shares both with
//! every chunk it creates, so the overlay outlives any single chunk.
//!
//! ## Chunk Generation
//!
//! New chunks are either generated inline or, with `async_loading` set,
//! published to a frame-budgeted [`TaskManager`]. Each queued chunk carries a
//! [`CancellationToken`] that is cancelled if the chunk is released before its
//! task runs.
//!
//! ## Edits Across Chunk Borders
//!
//! Obscured-voxel checks only look inside a chunk, so an edit next to a chunk
//! border also revisits the neighbor voxel in the adjacent chunk.

use std::cell::Ref;
use std::collections::HashMap;
use std::time::Duration;

use cgmath::Point3;
use log::{debug, info};

use crate::core::StResource;
use crate::engine_state::task_management::{CancellationToken, TaskManager};
use crate::engine_state::voxels::{
    block::{block_side::BlockSide, block_type::BlockId, VoxelRecord},
    chunk::{Chunk, ChunkCoord},
    data_store::DataStore,
    params::{ChunkSize, GenerationParams, ParamsError},
    render_command::RenderCommand,
    tasks::chunk_generation_task::ChunkGenerationTask,
};

/// Live chunks keyed by grid coordinate.
pub type ChunkMap = HashMap<ChunkCoord, Chunk>;

/// Splits a world voxel coordinate into its chunk and chunk-local coordinate.
///
/// Uses floor division, so negative coordinates land in negative chunks with
/// a local coordinate in `[0, width)`.
///
/// # Arguments
/// * `size` - Chunk dimensions
/// * `x`, `y`, `z` - World voxel coordinate
///
/// # Returns
/// The owning chunk and the local coordinate. `y` passes through unchanged.
///
/// ```
/// use voxel_sandbox::engine_state::voxels::{params::ChunkSize, world::world_to_chunk};
///
/// let (chunk, local) = world_to_chunk(ChunkSize { width: 16, height: 32 }, -1, 5, 16);
/// assert_eq!((chunk.x, chunk.z), (-1, 1));
/// assert_eq!((local.x, local.y, local.z), (15, 5, 0));
/// ```
pub fn world_to_chunk(size: ChunkSize, x: i32, y: i32, z: i32) -> (ChunkCoord, Point3<i32>) {
    let width = size.width;
    (
        ChunkCoord::new(x.div_euclid(width), z.div_euclid(width)),
        Point3::new(x.rem_euclid(width), y, z.rem_euclid(width)),
    )
}

/// Read access to voxels by world coordinate.
///
/// Implemented by [`World`]; ray casting and collision only need this much,
/// which keeps them testable against hand-built voxel sets.
pub trait BlockSource {
    /// The voxel at a world coordinate, or `None` if it is unknown.
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelRecord>;

    /// Known and non-empty. Unknown voxels are never solid.
    fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.block_at(x, y, z).is_some_and(|voxel| !voxel.is_empty())
    }
}

/// Represents a voxel world composed of streamed chunks.
pub struct World {
    params: StResource<GenerationParams>,
    data_store: StResource<DataStore>,
    chunks: ChunkMap,
    tokens: HashMap<ChunkCoord, CancellationToken>,
    task_manager: TaskManager<ChunkMap>,
    /// Render commands that outlive their chunk, i.e. releases.
    released: Vec<RenderCommand>,
    player_chunk: ChunkCoord,
    /// Where the player stood at the last update; `player_chunk` is derived
    /// from it again whenever the chunk width changes.
    player_position: Point3<f32>,
}

impl World {
    /// Creates an empty world. No chunk is generated until the first
    /// [`World::update`] or [`World::generate`].
    pub fn new(params: GenerationParams) -> Self {
        World {
            params: StResource::new(params),
            data_store: StResource::new(DataStore::new()),
            chunks: HashMap::new(),
            tokens: HashMap::new(),
            task_manager: TaskManager::new(),
            released: Vec::new(),
            player_chunk: ChunkCoord::default(),
            player_position: Point3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn params(&self) -> Ref<'_, GenerationParams> {
        self.params.get()
    }

    pub fn data_store(&self) -> Ref<'_, DataStore> {
        self.data_store.get()
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.params.get().chunk
    }

    /// The chunk the player was in at the last update.
    pub fn player_chunk(&self) -> ChunkCoord {
        self.player_chunk
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks still waiting for deferred generation, cancelled ones included.
    pub fn pending_generation_tasks(&self) -> usize {
        self.task_manager.len()
    }

    fn chunk_containing(&self, position: Point3<f32>) -> ChunkCoord {
        let width = self.chunk_size().width as f32;
        ChunkCoord::new(
            (position.x / width).floor() as i32,
            (position.z / width).floor() as i32,
        )
    }

    /// Every coordinate within Chebyshev draw distance of `center`.
    pub fn visible_chunks(&self, center: ChunkCoord) -> Vec<ChunkCoord> {
        let distance = self.params.get().draw_distance;
        let mut visible = Vec::new();
        for x in center.x - distance..=center.x + distance {
            for z in center.z - distance..=center.z + distance {
                visible.push(ChunkCoord::new(x, z));
            }
        }
        visible
    }

    /// Streams chunks around the player: releases chunks that left the draw
    /// distance and creates the ones that entered it.
    ///
    /// # Arguments
    /// * `player_position` - Player position in world units; only `x` and `z` matter
    pub fn update(&mut self, player_position: Point3<f32>) {
        self.player_position = player_position;
        let center = self.chunk_containing(player_position);
        self.player_chunk = center;

        let visible = self.visible_chunks(center);

        let stale: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|coord| !visible.contains(coord))
            .copied()
            .collect();
        for coord in stale {
            self.release_chunk(coord);
        }

        for coord in visible {
            if !self.chunks.contains_key(&coord) {
                self.create_chunk(coord);
            }
        }
    }

    fn create_chunk(&mut self, coord: ChunkCoord) {
        let mut chunk = Chunk::new(coord, self.params.clone(), self.data_store.clone());

        if self.params.get().async_loading {
            let token = CancellationToken::new();
            self.task_manager
                .publish_task(Box::new(ChunkGenerationTask::new(coord)), token.clone());
            self.tokens.insert(coord, token);
        } else {
            chunk.generate();
        }

        debug!("Created chunk ({}, {})", coord.x, coord.z);
        self.chunks.insert(coord, chunk);
    }

    fn release_chunk(&mut self, coord: ChunkCoord) {
        if let Some(token) = self.tokens.remove(&coord) {
            token.cancel();
        }
        if let Some(mut chunk) = self.chunks.remove(&coord) {
            chunk.dispose();
            self.released.push(RenderCommand::ReleaseChunk { chunk: coord });
            debug!("Released chunk ({}, {})", coord.x, coord.z);
        }
    }

    /// Runs deferred chunk generation for up to `budget` of wall-clock time.
    ///
    /// # Returns
    /// The number of chunks generated.
    pub fn process_generation_tasks(&mut self, budget: Duration) -> usize {
        let processed = self
            .task_manager
            .process_queued_tasks(&mut self.chunks, budget);
        let chunks = &self.chunks;
        self.tokens
            .retain(|coord, _| chunks.get(coord).is_some_and(|chunk| !chunk.is_loaded()));
        processed
    }

    /// Returns the voxel at a world coordinate.
    ///
    /// # Returns
    /// `None` if no loaded chunk owns the coordinate or it lies outside the
    /// vertical range. `None` is distinct from an empty voxel.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<VoxelRecord> {
        let (coord, local) = world_to_chunk(self.chunk_size(), x, y, z);
        let chunk = self.chunks.get(&coord).filter(|chunk| chunk.is_loaded())?;
        chunk.get(local.x, local.y, local.z).copied()
    }

    fn loaded_chunk_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord).filter(|chunk| chunk.is_loaded())
    }

    /// Places a block and hides any neighbor it now fully encloses.
    ///
    /// # Returns
    /// `false` if the target chunk is not loaded, the coordinate is out of
    /// range, or the target is occupied. Nothing changes in that case.
    pub fn add_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        let (coord, local) = world_to_chunk(self.chunk_size(), x, y, z);
        let Some(chunk) = self.loaded_chunk_mut(coord) else {
            return false;
        };
        if !chunk.add_block(local.x, local.y, local.z, id) {
            return false;
        }

        for offset in BlockSide::neighbor_offsets() {
            self.hide_block(x + offset.x, y + offset.y, z + offset.z);
        }
        debug!("Placed {} at ({}, {}, {})", id, x, y, z);
        true
    }

    /// Clears a block and reveals any neighbor that it was hiding.
    ///
    /// # Returns
    /// `false` if the target chunk is not loaded, the coordinate is out of
    /// range, or the target is already empty.
    pub fn remove_block(&mut self, x: i32, y: i32, z: i32) -> bool {
        let (coord, local) = world_to_chunk(self.chunk_size(), x, y, z);
        let Some(chunk) = self.loaded_chunk_mut(coord) else {
            return false;
        };
        if !chunk.remove_block(local.x, local.y, local.z) {
            return false;
        }

        for offset in BlockSide::neighbor_offsets() {
            self.reveal_block(x + offset.x, y + offset.y, z + offset.z);
        }
        debug!("Removed block at ({}, {}, {})", x, y, z);
        true
    }

    fn reveal_block(&mut self, x: i32, y: i32, z: i32) {
        let (coord, local) = world_to_chunk(self.chunk_size(), x, y, z);
        if let Some(chunk) = self.loaded_chunk_mut(coord) {
            chunk.add_block_instance(local.x, local.y, local.z);
        }
    }

    fn hide_block(&mut self, x: i32, y: i32, z: i32) {
        let (coord, local) = world_to_chunk(self.chunk_size(), x, y, z);
        if let Some(chunk) = self.loaded_chunk_mut(coord) {
            chunk.hide_if_obscured(local.x, local.y, local.z);
        }
    }

    /// Throws away every chunk and synchronously regenerates the draw distance
    /// around the player's last position, measured in the current chunk width.
    ///
    /// # Arguments
    /// * `clear_overlay` - Also forget every player edit
    pub fn generate(&mut self, clear_overlay: bool) {
        if clear_overlay {
            self.data_store.get_mut().clear();
        }

        self.task_manager.clear();
        let coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        for coord in coords {
            self.release_chunk(coord);
        }
        self.tokens.clear();

        self.player_chunk = self.chunk_containing(self.player_position);
        for coord in self.visible_chunks(self.player_chunk) {
            let mut chunk = Chunk::new(coord, self.params.clone(), self.data_store.clone());
            chunk.generate();
            self.chunks.insert(coord, chunk);
        }

        info!(
            "Generated {} chunks around ({}, {}), {} player edits",
            self.chunks.len(),
            self.player_chunk.x,
            self.player_chunk.z,
            self.data_store.get().len()
        );
    }

    /// Replaces the generation parameters and rebuilds the world from scratch,
    /// forgetting every player edit.
    ///
    /// # Returns
    /// The validation error, in which case nothing changed.
    pub fn set_params(&mut self, params: GenerationParams) -> Result<(), ParamsError> {
        params.validate()?;
        self.params.replace(params);
        self.generate(true);
        Ok(())
    }

    /// Replaces both the parameters and the edit overlay, then regenerates
    /// keeping the new overlay.
    ///
    /// # Returns
    /// The validation error, in which case nothing changed.
    pub fn restore(
        &mut self,
        params: GenerationParams,
        data_store: DataStore,
    ) -> Result<(), ParamsError> {
        params.validate()?;
        self.params.replace(params);
        self.data_store.replace(data_store);
        self.generate(false);
        Ok(())
    }

    /// Takes every render command queued since the last drain, releases first.
    pub fn drain_render_commands(&mut self) -> Vec<RenderCommand> {
        let mut commands = std::mem::take(&mut self.released);
        for chunk in self.chunks.values_mut() {
            commands.extend(chunk.drain_render_commands());
        }
        commands
    }
}

impl BlockSource for World {
    fn block_at(&self, x: i32, y: i32, z: i32) -> Option<VoxelRecord> {
        self.get_block(x, y, z)
    }
}
