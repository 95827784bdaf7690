//! # Block Type Module
//!
//! This module defines the closed set of block ids in the voxel world and the
//! static table of per-block properties (display name, render color and, for
//! ore-like blocks, default resource generation parameters).

use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

use super::BlockIdSize;

/// Enumerates every material a voxel can hold.
///
/// `Empty` is the distinguished "no voxel present" value. The discriminants are
/// stable: they index `BLOCK_TYPES` and are what the toolbar digit keys map to.
#[repr(u8)]
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlockId {
    /// No voxel present.
    #[default]
    Empty = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    CoalOre = 4,
    IronOre = 5,
    /// Tree trunk.
    Tree = 6,
    Leaves = 7,
    Sand = 8,
    Cloud = 9,
}

/// Default parameters for blocks that are scattered as resources.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResourceDefaults {
    /// Noise threshold above which the resource is placed.
    pub scarcity: f64,
    /// Noise scale along each axis.
    pub scale: [f64; 3],
}

/// Static, read-only properties of one block id.
#[derive(Copy, Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: &'static str,
    /// Render color as `0xRRGGBB`.
    pub color: u32,
    pub resource: Option<ResourceDefaults>,
}

impl BlockType {
    /// Splits the packed color into normalized RGB channels.
    pub fn color_rgb(&self) -> [f32; 3] {
        [
            ((self.color >> 16) & 0xff) as f32 / 255.0,
            ((self.color >> 8) & 0xff) as f32 / 255.0,
            (self.color & 0xff) as f32 / 255.0,
        ]
    }
}

/// Every block type, indexed by `BlockId as usize`.
pub static BLOCK_TYPES: [BlockType; BlockId::COUNT] = [
    BlockType {
        id: BlockId::Empty,
        name: "empty",
        color: 0x000000,
        resource: None,
    },
    BlockType {
        id: BlockId::Grass,
        name: "grass",
        color: 0x559020,
        resource: None,
    },
    BlockType {
        id: BlockId::Dirt,
        name: "dirt",
        color: 0x807020,
        resource: None,
    },
    BlockType {
        id: BlockId::Stone,
        name: "stone",
        color: 0x808080,
        resource: Some(ResourceDefaults {
            scarcity: 0.8,
            scale: [30.0, 30.0, 30.0],
        }),
    },
    BlockType {
        id: BlockId::CoalOre,
        name: "coal_ore",
        color: 0x202020,
        resource: Some(ResourceDefaults {
            scarcity: 0.8,
            scale: [20.0, 20.0, 20.0],
        }),
    },
    BlockType {
        id: BlockId::IronOre,
        name: "iron_ore",
        color: 0x806060,
        resource: Some(ResourceDefaults {
            scarcity: 0.9,
            scale: [40.0, 40.0, 40.0],
        }),
    },
    BlockType {
        id: BlockId::Tree,
        name: "tree",
        color: 0x805030,
        resource: None,
    },
    BlockType {
        id: BlockId::Leaves,
        name: "leaves",
        color: 0x80c080,
        resource: None,
    },
    BlockType {
        id: BlockId::Sand,
        name: "sand",
        color: 0xc0b060,
        resource: None,
    },
    BlockType {
        id: BlockId::Cloud,
        name: "cloud",
        color: 0xf0f0f0,
        resource: None,
    },
];

impl BlockId {
    /// Number of block ids, `Empty` included.
    pub const COUNT: usize = 10;

    /// Every non-empty block id, in discriminant order.
    pub const RENDERABLE: [BlockId; BlockId::COUNT - 1] = [
        BlockId::Grass,
        BlockId::Dirt,
        BlockId::Stone,
        BlockId::CoalOre,
        BlockId::IronOre,
        BlockId::Tree,
        BlockId::Leaves,
        BlockId::Sand,
        BlockId::Cloud,
    ];

    /// Converts a raw id back to a `BlockId`.
    ///
    /// # Returns
    /// `None` if `raw` does not name a block.
    pub fn from_raw(raw: BlockIdSize) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(raw)
    }

    /// Returns `true` for the "no voxel" id.
    pub fn is_empty(self) -> bool {
        self == BlockId::Empty
    }

    /// Looks up the static properties of this block.
    pub fn block_type(self) -> &'static BlockType {
        &BLOCK_TYPES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.block_type().name
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_discriminant() {
        for (index, block_type) in BLOCK_TYPES.iter().enumerate() {
            assert_eq!(block_type.id as usize, index);
        }
    }

    #[test]
    fn raw_ids_round_trip_and_reject_unknown_values() {
        assert_eq!(BlockId::from_raw(0), Some(BlockId::Empty));
        assert_eq!(BlockId::from_raw(5), Some(BlockId::IronOre));
        assert_eq!(BlockId::from_raw(BlockId::COUNT as u8), None);
    }

    #[test]
    fn only_ores_carry_resource_defaults() {
        let resources: Vec<_> = BLOCK_TYPES
            .iter()
            .filter(|block_type| block_type.resource.is_some())
            .map(|block_type| block_type.id)
            .collect();

        assert_eq!(
            resources,
            vec![BlockId::Stone, BlockId::CoalOre, BlockId::IronOre]
        );
    }

    #[test]
    fn ids_serialize_by_name() {
        let json = serde_json::to_string(&BlockId::CoalOre).unwrap();
        assert_eq!(json, "\"coal_ore\"");
        assert_eq!(BlockId::CoalOre.name(), "coal_ore");
    }
}
