//! # Voxel World
//!
//! This module contains everything that describes the voxel world itself,
//! independent of how it is drawn.
//!
//! ## Architecture
//!
//! * **Block**: the block table and per-voxel records
//! * **Random / Noise Field**: seeded sources every generation pass draws from
//! * **Params**: the tunables that shape a world, stored alongside saves
//! * **Chunk**: fixed-size columns of voxels, their generation passes and
//!   per-block instance batches
//! * **Data Store**: the player's edits, replayed over generated terrain
//! * **World**: the chunk grid around the player, streaming and editing
//! * **Ray Cast**: finding the voxel under the crosshair
//! * **Tasks**: deferred chunk generation
//!
//! ## Data Flow
//!
//! 1. The world streams chunks in around the player and queues their generation
//! 2. Generated chunks fill their instance batches with the visible voxels
//! 3. Every batch change becomes a [`render_command::RenderCommand`]
//! 4. The renderer drains the commands and mirrors the batches on the GPU

pub mod block;
pub mod chunk;
pub mod data_store;
pub mod noise_field;
pub mod params;
pub mod random;
pub mod raycast;
pub mod render_command;
pub mod tasks;
pub mod world;
