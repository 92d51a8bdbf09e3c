use rustc_hash::FxHashMap;

use crate::core::{Biome, BlockPos, BlockState, BoundingBox, Dimension};
use crate::world::access::{Entity, TileEntity, WorldAccess};

/// Ordered record of every mutation a placement performed.
#[derive(Clone, PartialEq, Debug)]
pub enum WorldMutation {
    SetBlock {
        pos: BlockPos,
        state: BlockState,
        accepted: bool,
    },
    SetTileEntity {
        pos: BlockPos,
    },
    SpawnEntity {
        kind: String,
    },
}

/// Flat in-memory world, used for placement previews and tests. Keeps an
/// ordered mutation log so callers can assert on emission order.
pub struct MemoryWorld {
    pub blocks: FxHashMap<BlockPos, BlockState>,
    pub tile_entities: FxHashMap<BlockPos, TileEntity>,
    pub entities: Vec<Entity>,
    pub log: Vec<WorldMutation>,
    pub biome: Biome,
    pub dimension: Dimension,
    /// Region in which block placement is refused, mimicking host
    /// protection plugins.
    pub protected: Option<BoundingBox>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self {
            blocks: FxHashMap::default(),
            tile_entities: FxHashMap::default(),
            entities: Vec::new(),
            log: Vec::new(),
            biome: Biome::Plains,
            dimension: Dimension::Overworld,
            protected: None,
        }
    }

    pub fn with_biome(mut self, biome: Biome) -> Self {
        self.biome = biome;
        self
    }

    pub fn set_block_count(&self) -> usize {
        self.log
            .iter()
            .filter(|m| matches!(m, WorldMutation::SetBlock { accepted: true, .. }))
            .count()
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldAccess for MemoryWorld {
    fn set_block(&mut self, pos: BlockPos, state: BlockState) -> bool {
        let accepted = !self.protected.is_some_and(|region| region.contains(pos));
        if accepted {
            self.blocks.insert(pos, state);
        }
        self.log.push(WorldMutation::SetBlock {
            pos,
            state,
            accepted,
        });
        accepted
    }

    fn set_tile_entity(&mut self, pos: BlockPos, tile_entity: TileEntity) {
        self.log.push(WorldMutation::SetTileEntity { pos });
        self.tile_entities.insert(pos, tile_entity);
    }

    fn spawn_entity(&mut self, entity: Entity) {
        self.log.push(WorldMutation::SpawnEntity {
            kind: entity.kind.clone(),
        });
        self.entities.push(entity);
    }

    fn block_at(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).copied().unwrap_or_default()
    }

    fn biome_at(&self, _pos: BlockPos) -> Biome {
        self.biome
    }

    fn dimension(&self) -> Dimension {
        self.dimension
    }
}
