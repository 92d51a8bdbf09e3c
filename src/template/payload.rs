use serde::{Deserialize, Serialize};

use crate::core::{BlockPos, BlockState, BlockType};
use crate::world::access::{Entity, TileEntity};

/// Dense block layout of a template. Dimensions are fixed at construction
/// and never change afterwards.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BlockCollection {
    width: i32,
    height: i32,
    length: i32,
    blocks: Vec<BlockType>,
    metas: Vec<u8>,
}

impl BlockCollection {
    pub fn new(width: i32, height: i32, length: i32) -> Self {
        let volume = (width.max(0) * height.max(0) * length.max(0)) as usize;
        Self {
            width,
            height,
            length,
            blocks: vec![BlockType::Air; volume],
            metas: vec![0; volume],
        }
    }

    /// Zero-sized collection, substituted when a payload is corrupt or
    /// absent.
    pub fn empty() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn size(&self) -> BlockPos {
        BlockPos::new(self.width, self.height, self.length)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn index(&self, pos: BlockPos) -> Option<usize> {
        if pos.x < 0
            || pos.x >= self.width
            || pos.y < 0
            || pos.y >= self.height
            || pos.z < 0
            || pos.z >= self.length
        {
            return None;
        }
        Some(((pos.y * self.length + pos.z) * self.width + pos.x) as usize)
    }

    pub fn get(&self, pos: BlockPos) -> BlockState {
        self.index(pos)
            .map(|i| BlockState::new(self.blocks[i], self.metas[i]))
            .unwrap_or_default()
    }

    pub fn set(&mut self, pos: BlockPos, state: BlockState) {
        if let Some(i) = self.index(pos) {
            self.blocks[i] = state.block;
            self.metas[i] = state.meta;
        }
    }

    /// Iterates every source-local coordinate in y, z, x order.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let (width, height, length) = (self.width, self.height, self.length);
        (0..height).flat_map(move |y| {
            (0..length).flat_map(move |z| (0..width).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

/// Raw world data owned by a template: the block layout plus contained
/// tile entities and entities, all in source-local coordinates.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct TemplatePayload {
    pub blocks: BlockCollection,
    pub tile_entities: Vec<TileEntity>,
    pub entities: Vec<Entity>,
}

impl TemplatePayload {
    pub fn new(blocks: BlockCollection) -> Self {
        Self {
            blocks,
            tile_entities: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(BlockCollection::empty())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl Default for TemplatePayload {
    fn default() -> Self {
        Self::empty()
    }
}
