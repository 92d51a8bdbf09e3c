// Core module with fundamental voxel types
pub mod core;

// Shared constants
pub mod constants;

// Placement engine and spawn context
pub mod engine;

// Boolean expression matchers with prefix-dispatched variables
pub mod matcher;

// Maze connectivity model
pub mod maze;

// Structure templates, transformers and the file format
pub mod template;

// World access abstraction, transforms and the in-memory world
pub mod world;

// Re-export commonly used types
pub use crate::core::{
    Biome, BiomeCategory, BlockPos, BlockState, BlockType, BoundingBox, Dimension,
};
pub use engine::{PlacementEngine, SpawnContext};
pub use matcher::{BiomeMatcher, BlockMatcher, DimensionMatcher, ExpressionCache};
pub use maze::{MazeRoom, MazeRoomConnection, SavedMazePath};
pub use template::{read_template, write_template, StructureTemplate, TemplateError};
pub use world::{MemoryWorld, Rotation, Transform, WorldAccess};
