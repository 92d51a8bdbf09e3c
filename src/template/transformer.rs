use rand::Rng as RngCore;
use serde::{Deserialize, Serialize};

use crate::core::{Biome, BiomeCategory, BlockPos, BlockState, BlockType};
use crate::engine::context::SpawnContext;
use crate::matcher::{BlockMatcher, ExpressionCache, ExpressionError};
use crate::template::payload::TemplatePayload;

/// Hook points around the main placement pass. A transformer with no phase
/// only vetoes direct emission.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Before,
    After,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedBlockState {
    pub weight: f64,
    pub state: BlockState,
}

/// Pluggable per-block rule: a match predicate that suppresses direct
/// emission, plus optional phase logic that emits in the engine's stead.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Transformer {
    /// Matched blocks become biome-appropriate terrain after placement.
    Natural { matcher: BlockMatcher },
    /// Matched blocks decay into plain air; nothing is emitted for them.
    NaturalAir { matcher: BlockMatcher },
    /// Matched blocks extend downward until they rest on solid ground.
    Pillar {
        matcher: BlockMatcher,
        block: BlockState,
    },
    /// Matched blocks are replaced, re-rolled per block.
    Replace {
        matcher: BlockMatcher,
        replace_with: Vec<WeightedBlockState>,
    },
    /// Matched blocks are replaced with one state rolled once per
    /// placement.
    ReplaceAll {
        matcher: BlockMatcher,
        replace_with: Vec<WeightedBlockState>,
    },
    /// Weathers the placed result by knocking out a fraction of blocks.
    Ruins { decay: f64, seed: u64 },
    /// Matched marker blocks leave the world untouched.
    NegativeSpace { matcher: BlockMatcher },
}

impl Transformer {
    /// The predicate that suppresses direct emission by the engine. First
    /// matching transformer in list order wins.
    pub fn skip_matcher(&self) -> Option<&BlockMatcher> {
        match self {
            Transformer::Natural { matcher }
            | Transformer::NaturalAir { matcher }
            | Transformer::Pillar { matcher, .. }
            | Transformer::Replace { matcher, .. }
            | Transformer::ReplaceAll { matcher, .. }
            | Transformer::NegativeSpace { matcher } => Some(matcher),
            Transformer::Ruins { .. } => None,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            Transformer::Replace { .. } | Transformer::ReplaceAll { .. } => Some(Phase::Before),
            Transformer::Natural { .. }
            | Transformer::Pillar { .. }
            | Transformer::Ruins { .. } => Some(Phase::After),
            Transformer::NaturalAir { .. } | Transformer::NegativeSpace { .. } => None,
        }
    }

    pub fn generates_in_phase(&self, phase: Phase) -> bool {
        self.phase() == Some(phase)
    }

    pub fn validate(&self, cache: &ExpressionCache) -> Result<(), ExpressionError> {
        if let Some(matcher) = self.skip_matcher() {
            matcher.compile(cache)?;
        }
        Ok(())
    }

    /// The first transformer in list order whose predicate matches claims
    /// a block; later transformers leave it alone.
    fn claimed_by_earlier(
        &self,
        siblings: &[Transformer],
        cache: &ExpressionCache,
        state: BlockState,
    ) -> bool {
        for sibling in siblings {
            if std::ptr::eq(sibling, self) {
                break;
            }
            if sibling
                .skip_matcher()
                .is_some_and(|m| m.matches(cache, state))
            {
                return true;
            }
        }
        false
    }

    /// Runs this transformer's phase logic. `siblings` is the template's
    /// full transformer list, used to resolve which transformer claims a
    /// block when several predicates match.
    pub fn run(
        &self,
        phase: Phase,
        ctx: &mut SpawnContext,
        payload: &TemplatePayload,
        siblings: &[Transformer],
        cache: &ExpressionCache,
    ) {
        if !self.generates_in_phase(phase) {
            return;
        }

        let area_size = payload.blocks.size();
        match self {
            Transformer::Natural { matcher } => {
                for source in payload.blocks.positions() {
                    let state = payload.blocks.get(source);
                    if !matcher.matches(cache, state)
                        || self.claimed_by_earlier(siblings, cache, state)
                    {
                        continue;
                    }
                    let world_pos = ctx.source_to_world(source, area_size);
                    let above = payload.blocks.get(source + BlockPos::new(0, 1, 0));
                    let covered = above.block.is_solid() || matcher.matches(cache, above);
                    let natural = natural_state(ctx.world.biome_at(world_pos), covered);
                    ctx.set_block(world_pos, natural);
                }
            }
            Transformer::Pillar { matcher, block } => {
                for source in payload.blocks.positions() {
                    let state = payload.blocks.get(source);
                    if !matcher.matches(cache, state)
                        || self.claimed_by_earlier(siblings, cache, state)
                    {
                        continue;
                    }
                    let world_pos = ctx.source_to_world(source, area_size);
                    ctx.set_block(world_pos, *block);

                    // Extend downward until resting on solid ground.
                    let mut y = world_pos.y - 1;
                    while y >= 0 {
                        let below = BlockPos::new(world_pos.x, y, world_pos.z);
                        if ctx.world.block_at(below).block.is_solid() {
                            break;
                        }
                        ctx.set_block(below, *block);
                        y -= 1;
                    }
                }
            }
            Transformer::Replace {
                matcher,
                replace_with,
            } => {
                for source in payload.blocks.positions() {
                    let state = payload.blocks.get(source);
                    if !matcher.matches(cache, state)
                        || self.claimed_by_earlier(siblings, cache, state)
                    {
                        continue;
                    }
                    let world_pos = ctx.source_to_world(source, area_size);
                    let replacement = sample_weighted(ctx.rng, replace_with);
                    ctx.set_block(world_pos, replacement);
                }
            }
            Transformer::ReplaceAll {
                matcher,
                replace_with,
            } => {
                let replacement = sample_weighted(ctx.rng, replace_with);
                for source in payload.blocks.positions() {
                    let state = payload.blocks.get(source);
                    if !matcher.matches(cache, state)
                        || self.claimed_by_earlier(siblings, cache, state)
                    {
                        continue;
                    }
                    let world_pos = ctx.source_to_world(source, area_size);
                    ctx.set_block(world_pos, replacement);
                }
            }
            Transformer::Ruins { decay, seed } => {
                for source in payload.blocks.positions() {
                    let state = payload.blocks.get(source);
                    if state.block.is_air_like() {
                        continue;
                    }
                    // Coordinates another transformer claimed were never
                    // emitted by the engine; leave them alone.
                    let claimed = siblings.iter().filter(|t| !std::ptr::eq(*t, self)).any(|t| {
                        t.skip_matcher()
                            .is_some_and(|m| m.matches(cache, state))
                    });
                    if claimed {
                        continue;
                    }
                    if decay_roll(*seed, source) < *decay {
                        let world_pos = ctx.source_to_world(source, area_size);
                        ctx.set_block(world_pos, BlockState::of(BlockType::Air));
                    }
                }
            }
            Transformer::NaturalAir { .. } | Transformer::NegativeSpace { .. } => {}
        }
    }
}

/// Terrain material for the Natural transformer, by biome.
fn natural_state(biome: Biome, covered: bool) -> BlockState {
    if biome.is_of_category(BiomeCategory::Sandy) {
        BlockState::of(BlockType::Sand)
    } else if biome.is_of_category(BiomeCategory::Water) {
        BlockState::of(BlockType::Gravel)
    } else if covered {
        BlockState::of(BlockType::Dirt)
    } else {
        BlockState::of(BlockType::Grass)
    }
}

fn sample_weighted(rng: &mut dyn RngCore, options: &[WeightedBlockState]) -> BlockState {
    let total: f64 = options.iter().map(|o| o.weight.max(0.0)).sum();
    if total <= 0.0 {
        return BlockState::of(BlockType::Air);
    }

    let mut roll = (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64 * total;
    for option in options {
        roll -= option.weight.max(0.0);
        if roll < 0.0 {
            return option.state;
        }
    }
    options.last().map(|o| o.state).unwrap_or_default()
}

/// Deterministic per-coordinate roll in [0, 1); stable across passes and
/// placements with the same seed.
fn decay_roll(seed: u64, pos: BlockPos) -> f64 {
    let mut hash = seed ^ 0x9e37_79b9_7f4a_7c15;
    for v in [pos.x, pos.y, pos.z] {
        hash = (hash ^ (v as u32 as u64)).wrapping_mul(0x100_0000_01b3);
        hash ^= hash >> 29;
    }
    (hash >> 11) as f64 / (1u64 << 53) as f64
}
