use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Biome, BlockPos, BlockState, Dimension};
use crate::world::transform::Transform;

/// Host capability for mutating and inspecting the target world. Supplied
/// by the caller; the engine never constructs one itself.
pub trait WorldAccess {
    /// Returns false if the host refused the placement (e.g. a protected
    /// region). Refusal skips that block, never the whole placement.
    fn set_block(&mut self, pos: BlockPos, state: BlockState) -> bool;

    fn set_tile_entity(&mut self, pos: BlockPos, tile_entity: TileEntity);

    fn spawn_entity(&mut self, entity: Entity);

    fn block_at(&self, pos: BlockPos) -> BlockState;

    fn biome_at(&self, pos: BlockPos) -> Biome;

    fn dimension(&self) -> Dimension;
}

/// A stack of items inside an inventory tile entity.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub count: u32,
}

/// Inventory payload of a tile entity. Loot tags are resolved by the host's
/// inventory generator when the structure is placed.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub loot_tags: Vec<String>,
    pub items: Vec<ItemStack>,
}

/// Reference to a nested template, expanded recursively by the engine.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GeneratorRef {
    pub template_id: String,
    pub offset: BlockPos,
    pub transform: Transform,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum TileEntityData {
    Inventory(Inventory),
    Generator(GeneratorRef),
    /// Opaque host data, carried through placement untouched.
    Custom(String),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TileEntity {
    pub pos: BlockPos,
    pub data: TileEntityData,
}

impl TileEntity {
    pub fn inventory_mut(&mut self) -> Option<&mut Inventory> {
        match &mut self.data {
            TileEntityData::Inventory(inventory) => Some(inventory),
            _ => None,
        }
    }

    pub fn generator(&self) -> Option<&GeneratorRef> {
        match &self.data {
            TileEntityData::Generator(generator) => Some(generator),
            _ => None,
        }
    }
}

/// An entity contained in a template payload, positioned in source-local
/// space until placement relocates it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub id: Uuid,
    pub kind: String,
    pub pos: Vec3,
}
