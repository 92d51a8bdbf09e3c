//! World-facing interfaces for structure placement
//! Contains the host mutation capability, geometric transforms and an
//! in-memory world used for previews and tests.

pub mod access;
pub mod memory;
pub mod transform;

// Re-export commonly used types
pub use access::{Entity, TileEntity, TileEntityData, WorldAccess};
pub use memory::MemoryWorld;
pub use transform::{Rotation, Transform};
