//! Two-pass structure placement
//! The engine maps a template's payload into world coordinates under the
//! context's transform, defers matched blocks to transformers, relocates
//! tile entities and entities, and expands nested generators up to a
//! bounded depth.

pub mod context;

pub use context::SpawnContext;

use std::collections::HashSet;
use std::sync::Arc;

use glam::Vec3;
use rand::Rng as RngCore;
use rustc_hash::FxHashMap;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::constants::*;
use crate::core::{BlockPos, BlockState, BlockType, BoundingBox};
use crate::matcher::ExpressionCache;
use crate::template::transformer::Phase;
use crate::template::StructureTemplate;
use crate::world::access::{GeneratorRef, Inventory, TileEntity};

/// Resolves nested template references during recursive expansion.
pub trait TemplateSource: Send + Sync {
    fn template(&self, id: &str) -> Option<Arc<StructureTemplate>>;
}

impl TemplateSource for FxHashMap<String, Arc<StructureTemplate>> {
    fn template(&self, id: &str) -> Option<Arc<StructureTemplate>> {
        self.get(id).cloned()
    }
}

/// Source with no templates; nested references resolve to nothing.
pub struct NoTemplates;

impl TemplateSource for NoTemplates {
    fn template(&self, _id: &str) -> Option<Arc<StructureTemplate>> {
        None
    }
}

/// Host capability answering whether a named feature (mod, datapack) is
/// present. Templates with unresolved dependencies are skipped.
pub trait FeatureIndex: Send + Sync {
    fn is_feature_loaded(&self, id: &str) -> bool;
}

impl FeatureIndex for HashSet<String> {
    fn is_feature_loaded(&self, id: &str) -> bool {
        self.contains(id)
    }
}

/// Index that reports every feature as loaded.
pub struct AllFeatures;

impl FeatureIndex for AllFeatures {
    fn is_feature_loaded(&self, _id: &str) -> bool {
        true
    }
}

/// Host hook filling inventory tile entities from their loot tags.
pub trait InventoryPopulator: Send + Sync {
    fn populate(&self, inventory: &mut Inventory, rng: &mut dyn RngCore);
}

/// Which emission pass a block belongs to. Full cubes and air-equivalents
/// go first; attachables (torches, stairs, décor) second, so they always
/// find their supporting block already present.
pub fn block_pass(block: BlockType) -> usize {
    if block.is_full_cube() || block.is_air_like() {
        0
    } else {
        1
    }
}

/// Top-level placement orchestrator. One engine serves many concurrent
/// placement calls; all per-call state lives in the [`SpawnContext`].
pub struct PlacementEngine {
    cache: Arc<ExpressionCache>,
    templates: Arc<dyn TemplateSource>,
    features: Arc<dyn FeatureIndex>,
    loot: Option<Arc<dyn InventoryPopulator>>,
}

impl PlacementEngine {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(ExpressionCache::new()),
            templates: Arc::new(NoTemplates),
            features: Arc::new(AllFeatures),
            loot: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ExpressionCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateSource>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_features(mut self, features: Arc<dyn FeatureIndex>) -> Self {
        self.features = features;
        self
    }

    pub fn with_loot(mut self, loot: Arc<dyn InventoryPopulator>) -> Self {
        self.loot = Some(loot);
        self
    }

    pub fn cache(&self) -> &ExpressionCache {
        &self.cache
    }

    /// Places `template` into the world through `ctx`. Mutation failures
    /// and malformed input are logged and skipped; this never panics the
    /// caller.
    pub fn generate(&self, template: &StructureTemplate, ctx: &mut SpawnContext) {
        if !template.dependencies_resolved(self.features.as_ref()) {
            debug!(
                template = %template.id,
                "skipping template, dependencies unresolved"
            );
            return;
        }

        let payload = &template.payload;
        let area_size = payload.blocks.size();
        let origin = ctx.lower_coord;

        // Index tile entities by source coordinate for O(1) lookup while
        // emitting blocks.
        let mut tile_index: FxHashMap<BlockPos, &TileEntity> = FxHashMap::default();
        for tile_entity in &payload.tile_entities {
            tile_index.insert(tile_entity.pos, tile_entity);
        }

        // Compile skip predicates once per placement. A matcher that fails
        // to compile is logged and never matches; load-time validation
        // normally catches this earlier.
        let skip_matchers: Vec<_> = template
            .transformers
            .iter()
            .map(|t| {
                t.skip_matcher().and_then(|m| match m.compile(&self.cache) {
                    Ok(compiled) => Some(compiled),
                    Err(e) => {
                        error!(template = %template.id, error = %e, "bad transformer expression");
                        None
                    }
                })
            })
            .collect();

        if !ctx.generate_as_source {
            for transformer in &template.transformers {
                transformer.run(Phase::Before, ctx, payload, &template.transformers, &self.cache);
            }
        }

        let mut pending: Vec<(GeneratorRef, BlockPos)> = Vec::new();

        for pass in 0..PLACEMENT_PASSES {
            for source in payload.blocks.positions() {
                let state = payload.blocks.get(source);
                if block_pass(state.block) != pass {
                    continue;
                }

                // The first transformer whose skip predicate matches claims
                // this block; emission is its responsibility, not ours.
                if !ctx.generate_as_source
                    && skip_matchers
                        .iter()
                        .any(|m| m.as_ref().is_some_and(|m| m.evaluate(&state)))
                {
                    continue;
                }

                let world_pos = ctx.source_to_world(source, area_size);
                let placed = ctx.transform.apply_state(state);
                if !ctx.set_block(world_pos, placed) {
                    // Host refused (protected region); skip this block only.
                    continue;
                }

                if let Some(tile_entity) = tile_index.get(&source) {
                    let mut tile_entity = (*tile_entity).clone();
                    tile_entity.pos = world_pos;

                    if !ctx.generate_as_source {
                        if let Some(inventory) = tile_entity.inventory_mut() {
                            if let Some(loot) = &self.loot {
                                loot.populate(inventory, ctx.rng);
                            }
                        }
                        if let Some(generator) = tile_entity.generator() {
                            pending.push((generator.clone(), world_pos));
                        }
                    }

                    ctx.world.set_tile_entity(world_pos, tile_entity);
                }
            }
        }

        if !ctx.generate_as_source {
            for transformer in &template.transformers {
                transformer.run(Phase::After, ctx, payload, &template.transformers, &self.cache);
            }
        }

        let origin_vec = Vec3::new(origin.x as f32, origin.y as f32, origin.z as f32);
        for entity in &payload.entities {
            let mut entity = entity.clone();
            // Never reuse the template's stored identity; multiple
            // placements of one template must not collide.
            entity.id = Uuid::new_v4();
            entity.pos = ctx.transform.apply_vec3(entity.pos, area_size) + origin_vec;
            if ctx.bounding_box.contains_vec3(entity.pos) {
                ctx.world.spawn_entity(entity);
            }
        }

        if pending.is_empty() {
            return;
        }
        if ctx.generation_layer >= MAX_GENERATION_LAYERS {
            warn!(
                template = %template.id,
                layers = MAX_GENERATION_LAYERS,
                "nested generation exceeded the layer cap; most likely a template cycle"
            );
            return;
        }

        for (generator, world_pos) in pending {
            let Some(child) = self.templates.template(&generator.template_id) else {
                warn!(
                    template = %template.id,
                    nested = %generator.template_id,
                    "nested template not found"
                );
                continue;
            };

            let child_origin = world_pos + generator.offset;
            let child_size = generator.transform.apply_size(child.bounding_box_size());
            let mut child_ctx = SpawnContext {
                world: &mut *ctx.world,
                rng: &mut *ctx.rng,
                transform: generator.transform,
                lower_coord: child_origin,
                bounding_box: BoundingBox::from_size(child_origin, child_size),
                generate_as_source: false,
                generation_layer: ctx.generation_layer + 1,
            };
            self.generate(&child, &mut child_ctx);
        }
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::BlockMatcher;
    use crate::template::payload::{BlockCollection, TemplatePayload};
    use crate::template::transformer::{Transformer, WeightedBlockState};
    use crate::world::access::{Entity, GeneratorRef, TileEntityData, WorldAccess};
    use crate::world::memory::{MemoryWorld, WorldMutation};
    use crate::world::transform::{Rotation, Transform};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn context<'a>(
        world: &'a mut MemoryWorld,
        rng: &'a mut StdRng,
        origin: BlockPos,
        size: BlockPos,
    ) -> SpawnContext<'a> {
        SpawnContext::new(
            world,
            rng,
            Transform::IDENTITY,
            origin,
            BoundingBox::from_size(origin, size),
        )
    }

    fn single_block_template(block: BlockType) -> StructureTemplate {
        let mut blocks = BlockCollection::new(1, 1, 1);
        blocks.set(BlockPos::ZERO, BlockState::of(block));
        StructureTemplate::new("single", TemplatePayload::new(blocks))
    }

    #[test]
    fn test_block_pass_is_pure_and_binary() {
        for block in [
            BlockType::Stone,
            BlockType::Air,
            BlockType::Torch,
            BlockType::Water,
            BlockType::WoodStairs,
            BlockType::NegativeSpace,
        ] {
            let pass = block_pass(block);
            assert!(pass < 2);
            assert_eq!(pass, block_pass(block));
        }
        assert_eq!(block_pass(BlockType::Stone), 0);
        assert_eq!(block_pass(BlockType::Air), 0);
        assert_eq!(block_pass(BlockType::Torch), 1);
        assert_eq!(block_pass(BlockType::WoodStairs), 1);
    }

    #[test]
    fn test_single_full_cube_places_once_in_pass_zero() {
        let template = single_block_template(BlockType::Stone);
        let engine = PlacementEngine::new();
        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1));

        engine.generate(&template, &mut ctx);

        assert_eq!(world.set_block_count(), 1);
        assert_eq!(
            world.block_at(BlockPos::ZERO),
            BlockState::of(BlockType::Stone)
        );
    }

    #[test]
    fn test_solids_before_attachables() {
        // A torch on top of a stone block: the stone occupies a later
        // iteration coordinate but must still be placed first.
        let mut blocks = BlockCollection::new(1, 2, 1);
        blocks.set(BlockPos::new(0, 0, 0), BlockState::of(BlockType::Torch));
        blocks.set(BlockPos::new(0, 1, 0), BlockState::of(BlockType::Stone));
        let template = StructureTemplate::new("torch", TemplatePayload::new(blocks));

        // Swap so the torch sits above the stone; iteration order (y
        // ascending) would visit the torch first without the pass split.
        let mut blocks = BlockCollection::new(1, 2, 1);
        blocks.set(BlockPos::new(0, 0, 0), BlockState::of(BlockType::Stone));
        blocks.set(BlockPos::new(0, 1, 0), BlockState::of(BlockType::Torch));
        let stacked = StructureTemplate::new("stack", TemplatePayload::new(blocks));

        for template in [template, stacked] {
            let engine = PlacementEngine::new();
            let mut world = MemoryWorld::new();
            let mut rng = StdRng::seed_from_u64(0);
            let mut ctx =
                context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 2, 1));
            engine.generate(&template, &mut ctx);

            let placements: Vec<_> = world
                .log
                .iter()
                .filter_map(|m| match m {
                    WorldMutation::SetBlock { state, .. } => Some(state.block),
                    _ => None,
                })
                .filter(|b| !b.is_air_like())
                .collect();
            assert_eq!(placements, vec![BlockType::Stone, BlockType::Torch]);
        }
    }

    #[test]
    fn test_skip_predicate_short_circuits_emission() {
        let mut template = single_block_template(BlockType::NegativeSpace);
        template.transformers = vec![Transformer::NegativeSpace {
            matcher: BlockMatcher::of(BlockType::NegativeSpace, 0),
        }];

        let engine = PlacementEngine::new();
        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1));
        engine.generate(&template, &mut ctx);

        // The engine never emits the matched block, and the negative-space
        // transformer leaves the world untouched.
        assert!(world.log.is_empty());
    }

    #[test]
    fn test_first_matching_transformer_wins() {
        // Both transformers match; the first (replace with planks) claims
        // the block, so the second never emits.
        let mut template = single_block_template(BlockType::NaturalFloor);
        template.transformers = vec![
            Transformer::Replace {
                matcher: BlockMatcher::new("natural_floor"),
                replace_with: vec![WeightedBlockState {
                    weight: 1.0,
                    state: BlockState::of(BlockType::Planks),
                }],
            },
            Transformer::Replace {
                matcher: BlockMatcher::new("natural_floor"),
                replace_with: vec![WeightedBlockState {
                    weight: 1.0,
                    state: BlockState::of(BlockType::Glass),
                }],
            },
        ];

        let engine = PlacementEngine::new();
        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1));
        engine.generate(&template, &mut ctx);

        assert_eq!(
            world.block_at(BlockPos::ZERO),
            BlockState::of(BlockType::Planks)
        );
    }

    fn self_nesting_template() -> (StructureTemplate, Arc<FxHashMap<String, Arc<StructureTemplate>>>) {
        let mut blocks = BlockCollection::new(1, 1, 1);
        blocks.set(BlockPos::ZERO, BlockState::of(BlockType::Stone));
        let mut payload = TemplatePayload::new(blocks);
        payload.tile_entities.push(TileEntity {
            pos: BlockPos::ZERO,
            data: TileEntityData::Generator(GeneratorRef {
                template_id: "loop".to_string(),
                offset: BlockPos::new(0, 1, 0),
                transform: Transform::IDENTITY,
            }),
        });
        let template = StructureTemplate::new("loop", payload);

        let mut registry: FxHashMap<String, Arc<StructureTemplate>> = FxHashMap::default();
        registry.insert("loop".to_string(), Arc::new(template.clone()));
        (template, Arc::new(registry))
    }

    #[test]
    fn test_recursion_caps_at_thirty_layers() {
        let (template, registry) = self_nesting_template();
        let engine = PlacementEngine::new().with_templates(registry);

        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1));
        engine.generate(&template, &mut ctx);

        // Root placement plus exactly MAX_GENERATION_LAYERS nested
        // expansions; the next layer is truncated, not an error.
        assert_eq!(
            world.set_block_count(),
            1 + MAX_GENERATION_LAYERS as usize
        );
        // Each layer stacked one block higher.
        assert!(world.blocks.contains_key(&BlockPos::new(0, 30, 0)));
        assert!(!world.blocks.contains_key(&BlockPos::new(0, 31, 0)));
    }

    #[test]
    fn test_dry_run_places_geometry_but_never_recurses() {
        let (template, registry) = self_nesting_template();
        let engine = PlacementEngine::new().with_templates(registry);

        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx =
            context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1)).as_source();
        engine.generate(&template, &mut ctx);

        assert_eq!(world.set_block_count(), 1);
        // Tile entity is still relocated for the preview.
        assert!(world.tile_entities.contains_key(&BlockPos::ZERO));
    }

    #[test]
    fn test_refused_block_skips_not_fails() {
        let mut blocks = BlockCollection::new(3, 1, 1);
        for x in 0..3 {
            blocks.set(BlockPos::new(x, 0, 0), BlockState::of(BlockType::Stone));
        }
        let template = StructureTemplate::new("row", TemplatePayload::new(blocks));

        let engine = PlacementEngine::new();
        let mut world = MemoryWorld::new();
        world.protected = Some(BoundingBox::from_size(
            BlockPos::new(1, 0, 0),
            BlockPos::new(1, 1, 1),
        ));
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(3, 1, 1));
        engine.generate(&template, &mut ctx);

        assert_eq!(world.set_block_count(), 2);
        assert!(world.blocks.contains_key(&BlockPos::new(0, 0, 0)));
        assert!(!world.blocks.contains_key(&BlockPos::new(1, 0, 0)));
        assert!(world.blocks.contains_key(&BlockPos::new(2, 0, 0)));
    }

    #[test]
    fn test_entities_clipped_to_bounding_box_with_fresh_identity() {
        let mut blocks = BlockCollection::new(2, 1, 1);
        blocks.set(BlockPos::new(0, 0, 0), BlockState::of(BlockType::Stone));
        let mut payload = TemplatePayload::new(blocks);
        let stored_id = Uuid::new_v4();
        payload.entities.push(Entity {
            id: stored_id,
            kind: "skeleton".to_string(),
            pos: Vec3::new(0.5, 0.0, 0.5),
        });
        payload.entities.push(Entity {
            id: Uuid::new_v4(),
            kind: "zombie".to_string(),
            pos: Vec3::new(5.5, 0.0, 0.5),
        });
        let template = StructureTemplate::new("mob", payload);

        let engine = PlacementEngine::new();
        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(2, 1, 1));
        engine.generate(&template, &mut ctx);

        // Only the in-bounds skeleton spawns, and with a regenerated id.
        assert_eq!(world.entities.len(), 1);
        assert_eq!(world.entities[0].kind, "skeleton");
        assert_ne!(world.entities[0].id, stored_id);
    }

    #[test]
    fn test_unresolved_dependency_skips_generation() {
        let mut template = single_block_template(BlockType::Stone);
        template.dependencies = vec!["missing_mod".to_string()];
        let engine =
            PlacementEngine::new().with_features(Arc::new(HashSet::<String>::new()));

        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1));
        engine.generate(&template, &mut ctx);

        assert!(world.log.is_empty());
    }

    struct FixedLoot;

    impl InventoryPopulator for FixedLoot {
        fn populate(&self, inventory: &mut Inventory, _rng: &mut dyn RngCore) {
            for tag in inventory.loot_tags.drain(..) {
                inventory.items.push(crate::world::access::ItemStack {
                    item: tag,
                    count: 1,
                });
            }
        }
    }

    #[test]
    fn test_inventory_loot_generated_outside_dry_run_only() {
        let mut blocks = BlockCollection::new(1, 1, 1);
        blocks.set(BlockPos::ZERO, BlockState::of(BlockType::Chest));
        let mut payload = TemplatePayload::new(blocks);
        payload.tile_entities.push(TileEntity {
            pos: BlockPos::ZERO,
            data: TileEntityData::Inventory(Inventory {
                loot_tags: vec!["dungeon_loot".to_string()],
                items: vec![],
            }),
        });
        let template = StructureTemplate::new("chest", payload);
        let engine = PlacementEngine::new().with_loot(Arc::new(FixedLoot));

        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = context(&mut world, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1));
        engine.generate(&template, &mut ctx);

        let placed = &world.tile_entities[&BlockPos::ZERO];
        match &placed.data {
            TileEntityData::Inventory(inventory) => {
                assert_eq!(inventory.items.len(), 1);
                assert_eq!(inventory.items[0].item, "dungeon_loot");
            }
            other => panic!("expected inventory, got {other:?}"),
        }

        // Dry run leaves the stored loot tags untouched.
        let mut preview = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx =
            context(&mut preview, &mut rng, BlockPos::ZERO, BlockPos::new(1, 1, 1)).as_source();
        engine.generate(&template, &mut ctx);
        match &preview.tile_entities[&BlockPos::ZERO].data {
            TileEntityData::Inventory(inventory) => {
                assert!(inventory.items.is_empty());
                assert_eq!(inventory.loot_tags.len(), 1);
            }
            other => panic!("expected inventory, got {other:?}"),
        }
    }

    #[test]
    fn test_rotation_rewrites_facing_metadata() {
        let mut blocks = BlockCollection::new(1, 1, 1);
        blocks.set(
            BlockPos::ZERO,
            BlockState::new(BlockType::WoodStairs, 0), // facing +z
        );
        let template = StructureTemplate::new("stairs", TemplatePayload::new(blocks));

        let engine = PlacementEngine::new();
        let mut world = MemoryWorld::new();
        let mut rng = StdRng::seed_from_u64(0);
        let mut ctx = SpawnContext::new(
            &mut world,
            &mut rng,
            Transform::new(Rotation::Clockwise90, false),
            BlockPos::ZERO,
            BoundingBox::from_size(BlockPos::ZERO, BlockPos::new(1, 1, 1)),
        );
        engine.generate(&template, &mut ctx);

        assert_eq!(
            world.block_at(BlockPos::ZERO),
            BlockState::new(BlockType::WoodStairs, 1)
        );
    }
}
