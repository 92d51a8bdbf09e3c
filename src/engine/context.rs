use rand::Rng as RngCore;

use crate::core::{BlockPos, BlockState, BoundingBox};
use crate::world::access::WorldAccess;
use crate::world::transform::Transform;

/// Per-invocation parameter bundle for one placement call. Built by the
/// caller, passed by reference through the whole call tree, never shared
/// between concurrent placements.
pub struct SpawnContext<'a> {
    pub world: &'a mut dyn WorldAccess,
    pub rng: &'a mut dyn RngCore,
    pub transform: Transform,
    /// Lower corner of the transformed structure in world space.
    pub lower_coord: BlockPos,
    /// Entities ending up outside this box are not spawned.
    pub bounding_box: BoundingBox,
    /// Dry-run mode: place geometry for previews, but skip transformers,
    /// loot generation and nested expansion.
    pub generate_as_source: bool,
    /// Depth of nested generator expansion, 0 for a root placement.
    pub generation_layer: u32,
}

impl<'a> SpawnContext<'a> {
    pub fn new(
        world: &'a mut dyn WorldAccess,
        rng: &'a mut dyn RngCore,
        transform: Transform,
        lower_coord: BlockPos,
        bounding_box: BoundingBox,
    ) -> Self {
        Self {
            world,
            rng,
            transform,
            lower_coord,
            bounding_box,
            generate_as_source: false,
            generation_layer: 0,
        }
    }

    pub fn as_source(mut self) -> Self {
        self.generate_as_source = true;
        self
    }

    /// Maps a source-local coordinate through the transform and origin.
    pub fn source_to_world(&self, source: BlockPos, area_size: BlockPos) -> BlockPos {
        self.transform.apply(source, area_size) + self.lower_coord
    }

    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) -> bool {
        self.world.set_block(pos, state)
    }
}
