use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum BlockType {
    #[default]
    Air,
    Grass,
    Dirt,
    Stone,
    Sand,
    Gravel,
    Water,
    Wood,
    Planks,
    Leaves,
    Glass,
    Torch,
    WoodStairs,
    Chest,
    Bedrock,
    Snow,
    // Marker blocks, only meaningful inside template payloads
    NaturalFloor,
    NegativeSpace,
}

impl BlockType {
    pub fn name(&self) -> &'static str {
        match self {
            BlockType::Air => "air",
            BlockType::Grass => "grass",
            BlockType::Dirt => "dirt",
            BlockType::Stone => "stone",
            BlockType::Sand => "sand",
            BlockType::Gravel => "gravel",
            BlockType::Water => "water",
            BlockType::Wood => "wood",
            BlockType::Planks => "planks",
            BlockType::Leaves => "leaves",
            BlockType::Glass => "glass",
            BlockType::Torch => "torch",
            BlockType::WoodStairs => "wood_stairs",
            BlockType::Chest => "chest",
            BlockType::Bedrock => "bedrock",
            BlockType::Snow => "snow",
            BlockType::NaturalFloor => "natural_floor",
            BlockType::NegativeSpace => "negative_space",
        }
    }

    pub fn from_name(name: &str) -> Option<BlockType> {
        [
            BlockType::Air,
            BlockType::Grass,
            BlockType::Dirt,
            BlockType::Stone,
            BlockType::Sand,
            BlockType::Gravel,
            BlockType::Water,
            BlockType::Wood,
            BlockType::Planks,
            BlockType::Leaves,
            BlockType::Glass,
            BlockType::Torch,
            BlockType::WoodStairs,
            BlockType::Chest,
            BlockType::Bedrock,
            BlockType::Snow,
            BlockType::NaturalFloor,
            BlockType::NegativeSpace,
        ]
        .into_iter()
        .find(|b| b.name() == name)
    }

    /// Marker blocks occupy no space in the world; they behave like air
    /// for pass assignment and physics.
    pub fn is_air_like(&self) -> bool {
        matches!(self, BlockType::Air | BlockType::NegativeSpace)
    }

    pub fn is_transparent(&self) -> bool {
        matches!(
            self,
            BlockType::Air
                | BlockType::Water
                | BlockType::Leaves
                | BlockType::Glass
                | BlockType::Torch
                | BlockType::WoodStairs
                | BlockType::NegativeSpace
        )
    }

    /// Full, opaque cubes. These support attachable blocks and are placed
    /// in the first emission pass.
    pub fn is_full_cube(&self) -> bool {
        !self.is_transparent() && !self.is_air_like()
    }

    pub fn is_solid(&self) -> bool {
        !matches!(
            self,
            BlockType::Air | BlockType::Water | BlockType::Torch | BlockType::NegativeSpace
        )
    }

    /// Whether the low two metadata bits encode a horizontal facing.
    pub fn has_facing(&self) -> bool {
        matches!(self, BlockType::Torch | BlockType::WoodStairs | BlockType::Chest)
    }
}

/// A block plus its metadata byte, as stored in template payloads.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct BlockState {
    pub block: BlockType,
    pub meta: u8,
}

impl BlockState {
    pub fn new(block: BlockType, meta: u8) -> Self {
        Self { block, meta }
    }

    pub fn of(block: BlockType) -> Self {
        Self { block, meta: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for block in [BlockType::Air, BlockType::WoodStairs, BlockType::NegativeSpace] {
            assert_eq!(BlockType::from_name(block.name()), Some(block));
        }
        assert_eq!(BlockType::from_name("obsidian"), None);
    }

    #[test]
    fn test_shape_predicates_partition() {
        // Every block is either a full cube, transparent, or air-like;
        // full cube excludes the other two.
        for block in [
            BlockType::Stone,
            BlockType::Glass,
            BlockType::Torch,
            BlockType::Air,
            BlockType::NegativeSpace,
        ] {
            if block.is_full_cube() {
                assert!(!block.is_transparent());
                assert!(!block.is_air_like());
            }
        }
        assert!(BlockType::Stone.is_full_cube());
        assert!(!BlockType::Glass.is_full_cube());
        assert!(BlockType::NegativeSpace.is_air_like());
    }
}
