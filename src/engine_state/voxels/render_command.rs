//! # Render Commands
//!
//! Instructions from the voxel core to the renderer. Chunks queue these while
//! they build or edit their instance batches; the engine drains them once per
//! frame and hands them to the buffer state. The core never touches GPU state.

use cgmath::Point3;

use super::{block::block_type::BlockId, chunk::ChunkCoord};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderCommand {
    /// Every batch of the chunk was rebuilt; re-upload all of them.
    UploadChunk { chunk: ChunkCoord },
    /// A single slot of one batch now holds `position` (world coordinates).
    WriteInstance {
        chunk: ChunkCoord,
        block: BlockId,
        slot: u32,
        position: Point3<i32>,
    },
    /// The live instance count of one batch changed.
    SetInstanceCount {
        chunk: ChunkCoord,
        block: BlockId,
        count: u32,
    },
    /// The chunk was unloaded; free its buffers.
    ReleaseChunk { chunk: ChunkCoord },
}

impl RenderCommand {
    /// The chunk this command targets.
    pub fn chunk(&self) -> ChunkCoord {
        match self {
            RenderCommand::UploadChunk { chunk }
            | RenderCommand::WriteInstance { chunk, .. }
            | RenderCommand::SetInstanceCount { chunk, .. }
            | RenderCommand::ReleaseChunk { chunk } => *chunk,
        }
    }
}
