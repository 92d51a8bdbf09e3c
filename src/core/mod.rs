//! Core data structures for structure placement
//! Contains fundamental types like blocks, biomes, dimensions and coordinates.

pub mod biome;
pub mod block;
pub mod coord;
pub mod dimension;

// Re-export commonly used types
pub use biome::{Biome, BiomeCategory};
pub use block::{BlockState, BlockType};
pub use coord::{BlockPos, BoundingBox};
pub use dimension::Dimension;
