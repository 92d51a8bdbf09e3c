use serde::{Deserialize, Serialize};

use crate::core::{Biome, BlockPos, Dimension};
use crate::matcher::{BiomeMatcher, DimensionMatcher, ExpressionCache, ExpressionError};
use crate::maze::{MazeRoom, SavedMazePath};

/// Where a template fronts when slotted into a structure list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Facing {
    South,
    West,
    North,
    East,
}

impl Facing {
    /// Horizontal facing quadrant as used in block metadata.
    pub fn quadrant(&self) -> u8 {
        match self {
            Facing::South => 0,
            Facing::West => 1,
            Facing::North => 2,
            Facing::East => 3,
        }
    }
}

/// Policy for selecting a template during natural world generation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalGenerationInfo {
    pub generation_category: String,
    pub generation_weight: f64,
    #[serde(default)]
    pub biomes: BiomeMatcher,
    #[serde(default)]
    pub dimensions: DimensionMatcher,
}

/// Membership in a named structure list, e.g. the pool a generator block
/// draws from.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureListGenerationInfo {
    pub list_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<Facing>,
}

/// Slot descriptor for maze-style generation: the rooms this piece covers
/// and the exits it offers, as saved paths.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MazeGenerationInfo {
    pub maze_id: String,
    pub weight: f64,
    #[serde(default)]
    pub rooms: Vec<MazeRoom>,
    #[serde(default)]
    pub exit_paths: Vec<SavedMazePath>,
}

/// Fixed-position generation relative to the world spawn.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticGenerationInfo {
    #[serde(default)]
    pub dimensions: DimensionMatcher,
    pub position: BlockPos,
    #[serde(default)]
    pub relative_to_spawn: bool,
}

/// Hook into a host-generated feature (village, stronghold, ...).
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VanillaGenerationInfo {
    pub generates_in: String,
    pub generation_weight: f64,
    #[serde(default)]
    pub biomes: BiomeMatcher,
}

/// Placement policy attached to a template. The engine reads these as
/// configuration and never mutates them.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerationInfo {
    Natural(NaturalGenerationInfo),
    StructureList(StructureListGenerationInfo),
    MazeComponent(MazeGenerationInfo),
    Static(StaticGenerationInfo),
    Vanilla(VanillaGenerationInfo),
}

impl GenerationInfo {
    /// Whether this policy allows generation in the given biome and
    /// dimension. Policies without a biome or dimension rule accept any.
    pub fn selectable_in(
        &self,
        cache: &ExpressionCache,
        biome: Biome,
        dimension: Dimension,
    ) -> bool {
        match self {
            GenerationInfo::Natural(info) => {
                info.biomes.matches(cache, biome) && info.dimensions.matches(cache, dimension)
            }
            GenerationInfo::Vanilla(info) => info.biomes.matches(cache, biome),
            GenerationInfo::Static(info) => info.dimensions.matches(cache, dimension),
            GenerationInfo::StructureList(_) | GenerationInfo::MazeComponent(_) => true,
        }
    }

    pub fn generation_weight(&self) -> f64 {
        match self {
            GenerationInfo::Natural(info) => info.generation_weight,
            GenerationInfo::MazeComponent(info) => info.weight,
            GenerationInfo::Vanilla(info) => info.generation_weight,
            GenerationInfo::StructureList(_) | GenerationInfo::Static(_) => 1.0,
        }
    }

    /// Fails fast on malformed matcher expressions; called at template
    /// load so evaluation never sees an unparsable rule.
    pub fn validate(&self, cache: &ExpressionCache) -> Result<(), ExpressionError> {
        match self {
            GenerationInfo::Natural(info) => {
                info.biomes.compile(cache)?;
                info.dimensions.compile(cache)?;
            }
            GenerationInfo::Vanilla(info) => {
                info.biomes.compile(cache)?;
            }
            GenerationInfo::Static(info) => {
                info.dimensions.compile(cache)?;
            }
            GenerationInfo::StructureList(_) | GenerationInfo::MazeComponent(_) => {}
        }
        Ok(())
    }
}

impl Default for NaturalGenerationInfo {
    fn default() -> Self {
        Self {
            generation_category: "decoration".to_string(),
            generation_weight: 1.0,
            biomes: BiomeMatcher::default(),
            dimensions: DimensionMatcher::default(),
        }
    }
}
