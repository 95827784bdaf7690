//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which runs the generation
//! passes of a chunk that was created with deferred loading. The task only
//! knows the chunk's grid coordinate: if the chunk has left the draw distance
//! by the time the task runs, there is nothing to look up and the task is a
//! no-op.

use crate::engine_state::{
    task_management::task::Task,
    voxels::{chunk::ChunkCoord, world::ChunkMap},
};

/// Generates the chunk at `coord` in the live chunk map.
pub struct ChunkGenerationTask {
    coord: ChunkCoord,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `coord` - Grid coordinate of the chunk to generate
    pub fn new(coord: ChunkCoord) -> Self {
        ChunkGenerationTask { coord }
    }
}

impl Task<ChunkMap> for ChunkGenerationTask {
    fn process(self: Box<Self>, chunks: &mut ChunkMap) -> Vec<Box<dyn Task<ChunkMap>>> {
        if let Some(chunk) = chunks.get_mut(&self.coord) {
            if !chunk.is_loaded() {
                chunk.generate();
            }
        }
        Vec::new()
    }

    fn describe(&self) -> String {
        format!("generation of chunk ({}, {})", self.coord.x, self.coord.z)
    }
}
