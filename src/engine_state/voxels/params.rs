//! # Generation Parameters
//!
//! Every tunable that shapes the procedural world: seed, terrain, resource
//! layers, trees, clouds, chunk dimensions and streaming behavior.
//!
//! The parameters are plain serde data. They are what the save slot stores
//! next to the player's edits, and `Default` gives the stock world.
//!
//! ```
//! use voxel_sandbox::engine_state::voxels::params::GenerationParams;
//!
//! let params = GenerationParams::default();
//! let json = serde_json::to_string(&params).unwrap();
//! let parsed: GenerationParams = serde_json::from_str(&json).unwrap();
//! assert_eq!(parsed, params);
//! ```

use serde::{Deserialize, Serialize};

use super::block::block_type::{BlockId, BLOCK_TYPES};

/// Widest chunk accepted; every render batch is allocated for a full chunk volume.
pub const MAX_CHUNK_WIDTH: i32 = 64;
/// Tallest chunk accepted.
pub const MAX_CHUNK_HEIGHT: i32 = 256;

/// Errors raised when a parameter set cannot describe a world.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("chunk width must be in 1..={max}, got {0}", max = MAX_CHUNK_WIDTH)]
    ChunkWidth(i32),
    #[error("chunk height must be in 1..={max}, got {0}", max = MAX_CHUNK_HEIGHT)]
    ChunkHeight(i32),
    #[error("draw distance must not be negative, got {0}")]
    DrawDistance(i32),
    #[error("{what} range is inverted: min {min} > max {max}")]
    InvertedRange {
        what: &'static str,
        min: u32,
        max: u32,
    },
    #[error("{0} is not a resource block")]
    NotAResource(BlockId),
}

/// Column height field parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Horizontal noise scale; larger is smoother.
    pub scale: f64,
    /// Height swing applied to the noise sample.
    pub magnitude: f64,
    /// Base height added to the scaled sample.
    pub offset: f64,
    /// Surface voxels at or below this height become sand.
    pub water_height: i32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 20.0,
            magnitude: 10.0,
            offset: 4.0,
            water_height: 3,
        }
    }
}

/// One resource layer scattered through the chunk volume.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceParams {
    pub block: BlockId,
    /// Noise threshold above which the resource is placed.
    pub scarcity: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
}

impl ResourceParams {
    /// Builds a layer from the block table defaults.
    ///
    /// # Returns
    /// `None` if the block has no resource defaults.
    pub fn from_block(block: BlockId) -> Option<Self> {
        let defaults = block.block_type().resource?;
        Some(Self {
            block,
            scarcity: defaults.scarcity,
            scale_x: defaults.scale[0],
            scale_y: defaults.scale[1],
            scale_z: defaults.scale[2],
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkParams {
    pub min_height: u32,
    pub max_height: u32,
}

impl Default for TrunkParams {
    fn default() -> Self {
        Self {
            min_height: 4,
            max_height: 7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanopyParams {
    pub min_radius: u32,
    pub max_radius: u32,
    /// Chance that a voxel inside the canopy sphere becomes leaves.
    pub density: f64,
}

impl Default for CanopyParams {
    fn default() -> Self {
        Self {
            min_radius: 2,
            max_radius: 3,
            density: 0.8,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Chance per eligible column of growing a tree.
    pub frequency: f64,
    pub trunk: TrunkParams,
    pub canopy: CanopyParams,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            frequency: 0.001,
            trunk: TrunkParams::default(),
            canopy: CanopyParams::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudParams {
    pub scale: f64,
    /// Fraction of the sky covered; compared against noise remapped to `[0, 1]`.
    pub density: f64,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self {
            scale: 30.0,
            density: 0.2,
        }
    }
}

/// Chunk dimensions. `width` spans both horizontal axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSize {
    pub width: i32,
    pub height: i32,
}

impl ChunkSize {
    /// Number of voxels in one chunk.
    pub fn volume(&self) -> usize {
        self.width.max(0) as usize * self.width.max(0) as usize * self.height.max(0) as usize
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self {
            width: 16,
            height: 32,
        }
    }
}

/// The complete parameter set shared by the world and all of its chunks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub seed: i64,
    pub terrain: TerrainParams,
    /// Resource layers, applied in order; later layers overwrite earlier ones.
    pub resources: Vec<ResourceParams>,
    pub trees: TreeParams,
    pub clouds: CloudParams,
    pub chunk: ChunkSize,
    /// Chebyshev radius, in chunks, kept loaded around the player.
    pub draw_distance: i32,
    /// Defer chunk generation to the frame-budgeted queue instead of building inline.
    pub async_loading: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            seed: 0,
            terrain: TerrainParams::default(),
            resources: BLOCK_TYPES
                .iter()
                .filter_map(|block_type| ResourceParams::from_block(block_type.id))
                .collect(),
            trees: TreeParams::default(),
            clouds: CloudParams::default(),
            chunk: ChunkSize::default(),
            draw_distance: 2,
            async_loading: true,
        }
    }
}

impl GenerationParams {
    /// Checks that the parameters describe a buildable world.
    ///
    /// # Returns
    /// The first problem found, if any.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(1..=MAX_CHUNK_WIDTH).contains(&self.chunk.width) {
            return Err(ParamsError::ChunkWidth(self.chunk.width));
        }
        if !(1..=MAX_CHUNK_HEIGHT).contains(&self.chunk.height) {
            return Err(ParamsError::ChunkHeight(self.chunk.height));
        }
        if self.draw_distance < 0 {
            return Err(ParamsError::DrawDistance(self.draw_distance));
        }
        let trunk = &self.trees.trunk;
        if trunk.min_height > trunk.max_height {
            return Err(ParamsError::InvertedRange {
                what: "trunk height",
                min: trunk.min_height,
                max: trunk.max_height,
            });
        }
        let canopy = &self.trees.canopy;
        if canopy.min_radius > canopy.max_radius {
            return Err(ParamsError::InvertedRange {
                what: "canopy radius",
                min: canopy.min_radius,
                max: canopy.max_radius,
            });
        }
        if let Some(resource) = self
            .resources
            .iter()
            .find(|resource| resource.block.is_empty())
        {
            return Err(ParamsError::NotAResource(resource.block));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_stock_world() {
        let params = GenerationParams::default();

        assert_eq!(params.seed, 0);
        assert_eq!(params.terrain.water_height, 3);
        assert_eq!(params.trees.trunk, TrunkParams { min_height: 4, max_height: 7 });
        assert_eq!(params.chunk, ChunkSize { width: 16, height: 32 });
        assert_eq!(
            params
                .resources
                .iter()
                .map(|resource| resource.block)
                .collect::<Vec<_>>(),
            vec![BlockId::Stone, BlockId::CoalOre, BlockId::IronOre]
        );
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params: GenerationParams =
            serde_json::from_str(r#"{ "seed": 99, "chunk": { "height": 4 } }"#).unwrap();

        assert_eq!(params.seed, 99);
        assert_eq!(params.chunk, ChunkSize { width: 16, height: 4 });
        assert_eq!(params.clouds, CloudParams::default());
    }

    #[test]
    fn validate_bounds_chunk_dimensions() {
        let mut params = GenerationParams::default();
        params.chunk = ChunkSize {
            width: MAX_CHUNK_WIDTH,
            height: MAX_CHUNK_HEIGHT,
        };
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.chunk.volume(), 64 * 64 * 256);

        params.chunk.width = 100_000;
        assert_eq!(params.validate(), Err(ParamsError::ChunkWidth(100_000)));

        params.chunk.width = 16;
        params.chunk.height = i32::MAX;
        assert_eq!(params.validate(), Err(ParamsError::ChunkHeight(i32::MAX)));
        assert_eq!(
            ParamsError::ChunkHeight(300).to_string(),
            "chunk height must be in 1..=256, got 300"
        );
    }

    #[test]
    fn validate_rejects_degenerate_worlds() {
        let mut params = GenerationParams::default();
        params.chunk.width = 0;
        assert_eq!(params.validate(), Err(ParamsError::ChunkWidth(0)));

        let mut params = GenerationParams::default();
        params.trees.canopy.min_radius = 5;
        assert!(matches!(
            params.validate(),
            Err(ParamsError::InvertedRange { what: "canopy radius", .. })
        ));

        let mut params = GenerationParams::default();
        params.resources.push(ResourceParams {
            block: BlockId::Empty,
            scarcity: 0.5,
            scale_x: 1.0,
            scale_y: 1.0,
            scale_z: 1.0,
        });
        assert_eq!(params.validate(), Err(ParamsError::NotAResource(BlockId::Empty)));
    }
}
