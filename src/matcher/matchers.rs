use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::core::{Biome, BiomeCategory, BlockState, BlockType, Dimension};
use crate::matcher::algebra::ExpressionError;
use crate::matcher::cache::ExpressionCache;
use crate::matcher::types::{ExpressionMatcher, VariableType};

/// Biome rule, e.g. `"Plains | $FOREST"`. Unprefixed tokens name a biome,
/// `$`-prefixed tokens name a biome category.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomeMatcher {
    pub expression: String,
}

impl BiomeMatcher {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Builds the conjunction of category tokens, e.g. `"$COLD & $WET"`.
    pub fn of_categories(categories: &[BiomeCategory]) -> Self {
        let expression = categories
            .iter()
            .map(|c| format!("{BIOME_CATEGORY_PREFIX}{}", c.name()))
            .collect::<Vec<_>>()
            .join(" & ");
        Self { expression }
    }

    pub fn compile(
        &self,
        cache: &ExpressionCache,
    ) -> Result<ExpressionMatcher<Biome, [Biome]>, ExpressionError> {
        ExpressionMatcher::new(
            cache,
            &self.expression,
            "Any Biome",
            vec![Box::new(BiomeNameType), Box::new(BiomeCategoryType)],
        )
    }

    pub fn matches(&self, cache: &ExpressionCache, biome: Biome) -> bool {
        self.compile(cache).map(|m| m.evaluate(&biome)).unwrap_or(false)
    }

    pub fn contains_unknown_variables(&self, cache: &ExpressionCache) -> bool {
        self.compile(cache)
            .map(|m| m.contains_unknown_variables(Biome::all()))
            .unwrap_or(true)
    }

    pub fn describe(&self, cache: &ExpressionCache) -> String {
        self.compile(cache)
            .map(|m| m.describe(Biome::all()))
            .unwrap_or_else(|e| e.to_string())
    }
}

struct BiomeNameType;

impl VariableType<Biome, [Biome]> for BiomeNameType {
    fn prefix(&self) -> &str {
        ""
    }

    fn evaluate(&self, token: &str, subject: &Biome) -> bool {
        subject.name().eq_ignore_ascii_case(token)
    }

    fn is_known(&self, token: &str, universe: &[Biome]) -> bool {
        universe.iter().any(|b| b.name().eq_ignore_ascii_case(token))
    }
}

struct BiomeCategoryType;

impl VariableType<Biome, [Biome]> for BiomeCategoryType {
    fn prefix(&self) -> &str {
        BIOME_CATEGORY_PREFIX
    }

    fn evaluate(&self, token: &str, subject: &Biome) -> bool {
        BiomeCategory::from_name(token).is_some_and(|c| subject.is_of_category(c))
    }

    fn is_known(&self, token: &str, _universe: &[Biome]) -> bool {
        BiomeCategory::from_name(token).is_some()
    }
}

/// Dimension rule, e.g. `"overworld | #UNNATURAL"`. Unprefixed tokens name
/// a dimension, `#`-prefixed tokens name a dimension tag.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DimensionMatcher {
    pub expression: String,
}

impl DimensionMatcher {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    pub fn compile(
        &self,
        cache: &ExpressionCache,
    ) -> Result<ExpressionMatcher<Dimension, [Dimension]>, ExpressionError> {
        ExpressionMatcher::new(
            cache,
            &self.expression,
            "Any Dimension",
            vec![Box::new(DimensionNameType), Box::new(DimensionTagType)],
        )
    }

    pub fn matches(&self, cache: &ExpressionCache, dimension: Dimension) -> bool {
        self.compile(cache)
            .map(|m| m.evaluate(&dimension))
            .unwrap_or(false)
    }

    pub fn contains_unknown_variables(&self, cache: &ExpressionCache) -> bool {
        self.compile(cache)
            .map(|m| m.contains_unknown_variables(Dimension::all()))
            .unwrap_or(true)
    }

    pub fn describe(&self, cache: &ExpressionCache) -> String {
        self.compile(cache)
            .map(|m| m.describe(Dimension::all()))
            .unwrap_or_else(|e| e.to_string())
    }
}

struct DimensionNameType;

impl VariableType<Dimension, [Dimension]> for DimensionNameType {
    fn prefix(&self) -> &str {
        ""
    }

    fn evaluate(&self, token: &str, subject: &Dimension) -> bool {
        subject.name().eq_ignore_ascii_case(token)
    }

    fn is_known(&self, token: &str, universe: &[Dimension]) -> bool {
        universe.iter().any(|d| d.name().eq_ignore_ascii_case(token))
    }
}

struct DimensionTagType;

impl VariableType<Dimension, [Dimension]> for DimensionTagType {
    fn prefix(&self) -> &str {
        DIMENSION_TAG_PREFIX
    }

    fn evaluate(&self, token: &str, subject: &Dimension) -> bool {
        subject.has_tag(token)
    }

    fn is_known(&self, token: &str, universe: &[Dimension]) -> bool {
        universe.iter().any(|d| d.has_tag(token))
    }
}

/// Block rule used by transformer predicates, e.g. `"stone & #1-3"`.
/// Unprefixed tokens name a block type, `#`-prefixed tokens restrict the
/// metadata value (single values, ranges, comma lists).
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockMatcher {
    pub expression: String,
}

impl BlockMatcher {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    /// Matcher for one exact block/metadata pair.
    pub fn of(block: BlockType, meta: u8) -> Self {
        Self {
            expression: format!("{} & {BLOCK_METADATA_PREFIX}{meta}", block.name()),
        }
    }

    pub fn compile(
        &self,
        cache: &ExpressionCache,
    ) -> Result<ExpressionMatcher<BlockState, [BlockType]>, ExpressionError> {
        ExpressionMatcher::new(
            cache,
            &self.expression,
            "Any Block",
            vec![Box::new(BlockNameType), Box::new(MetadataType)],
        )
    }

    pub fn matches(&self, cache: &ExpressionCache, state: BlockState) -> bool {
        self.compile(cache).map(|m| m.evaluate(&state)).unwrap_or(false)
    }

    pub fn contains_unknown_variables(&self, cache: &ExpressionCache) -> bool {
        self.compile(cache)
            .map(|m| m.contains_unknown_variables(&ALL_BLOCKS))
            .unwrap_or(true)
    }

    pub fn describe(&self, cache: &ExpressionCache) -> String {
        self.compile(cache)
            .map(|m| m.describe(&ALL_BLOCKS))
            .unwrap_or_else(|e| e.to_string())
    }
}

const ALL_BLOCKS: [BlockType; 18] = [
    BlockType::Air,
    BlockType::Grass,
    BlockType::Dirt,
    BlockType::Stone,
    BlockType::Sand,
    BlockType::Gravel,
    BlockType::Water,
    BlockType::Wood,
    BlockType::Planks,
    BlockType::Leaves,
    BlockType::Glass,
    BlockType::Torch,
    BlockType::WoodStairs,
    BlockType::Chest,
    BlockType::Bedrock,
    BlockType::Snow,
    BlockType::NaturalFloor,
    BlockType::NegativeSpace,
];

struct BlockNameType;

impl VariableType<BlockState, [BlockType]> for BlockNameType {
    fn prefix(&self) -> &str {
        ""
    }

    fn evaluate(&self, token: &str, subject: &BlockState) -> bool {
        subject.block.name().eq_ignore_ascii_case(token)
    }

    fn is_known(&self, token: &str, universe: &[BlockType]) -> bool {
        universe.iter().any(|b| b.name().eq_ignore_ascii_case(token))
    }
}

struct MetadataType;

/// Parses `"0"`, `"1-3"` or `"0,2,5-7"` into inclusive ranges.
fn parse_meta_ranges(token: &str) -> Option<Vec<(u8, u8)>> {
    token
        .split(',')
        .map(|part| {
            if let Some((lo, hi)) = part.split_once('-') {
                Some((lo.trim().parse().ok()?, hi.trim().parse().ok()?))
            } else {
                let value: u8 = part.trim().parse().ok()?;
                Some((value, value))
            }
        })
        .collect()
}

impl VariableType<BlockState, [BlockType]> for MetadataType {
    fn prefix(&self) -> &str {
        BLOCK_METADATA_PREFIX
    }

    fn evaluate(&self, token: &str, subject: &BlockState) -> bool {
        parse_meta_ranges(token).is_some_and(|ranges| {
            ranges
                .iter()
                .any(|(lo, hi)| subject.meta >= *lo && subject.meta <= *hi)
        })
    }

    fn is_known(&self, token: &str, _universe: &[BlockType]) -> bool {
        parse_meta_ranges(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biome_conjunction_of_categories() {
        let cache = ExpressionCache::new();
        let matcher = BiomeMatcher::new("$PLAINS & $FOREST");
        // Satisfies only $PLAINS.
        assert!(!matcher.matches(&cache, Biome::Plains));
        // Island is both Plains and Water, still not Forest.
        assert!(!matcher.matches(&cache, Biome::Island));

        let both = BiomeMatcher::new("$PLAINS & $WATER");
        assert!(both.matches(&cache, Biome::Island));
    }

    #[test]
    fn test_of_categories_builds_conjunction() {
        let cache = ExpressionCache::new();
        let matcher = BiomeMatcher::of_categories(&[BiomeCategory::Cold, BiomeCategory::Wet]);
        assert_eq!(matcher.expression, "$COLD & $WET");
        assert!(!matcher.matches(&cache, Biome::Tundra));
        assert!(!matcher.contains_unknown_variables(&cache));
    }

    #[test]
    fn test_biome_name_and_negation() {
        let cache = ExpressionCache::new();
        let matcher = BiomeMatcher::new("!Desert");
        assert!(matcher.matches(&cache, Biome::Plains));
        assert!(!matcher.matches(&cache, Biome::Desert));
    }

    #[test]
    fn test_mixed_vocabularies_in_one_expression() {
        let cache = ExpressionCache::new();
        let matcher = BiomeMatcher::new("Tundra | $HOT");
        assert!(matcher.matches(&cache, Biome::Tundra));
        assert!(matcher.matches(&cache, Biome::Desert));
        assert!(!matcher.matches(&cache, Biome::Forest));
    }

    #[test]
    fn test_unknown_variable_evaluates_false_but_is_flagged() {
        let cache = ExpressionCache::new();
        let matcher = BiomeMatcher::new("$SWAMPLAND");
        assert!(!matcher.matches(&cache, Biome::Swamp));
        assert!(matcher.contains_unknown_variables(&cache));
        assert_eq!(matcher.describe(&cache), "$SWAMPLAND?");

        let known = BiomeMatcher::new("$WET");
        assert!(!known.contains_unknown_variables(&cache));
    }

    #[test]
    fn test_empty_expression_matches_all() {
        let cache = ExpressionCache::new();
        let matcher = BiomeMatcher::default();
        assert!(matcher.matches(&cache, Biome::Ocean));
        assert_eq!(matcher.describe(&cache), "Any Biome");
    }

    #[test]
    fn test_dimension_tags() {
        let cache = ExpressionCache::new();
        let matcher = DimensionMatcher::new("#UNNATURAL");
        assert!(!matcher.matches(&cache, Dimension::Overworld));
        assert!(matcher.matches(&cache, Dimension::Underworld));
        assert!(matcher.matches(&cache, Dimension::Sky));
    }

    #[test]
    fn test_block_matcher_of_pair() {
        let cache = ExpressionCache::new();
        let matcher = BlockMatcher::of(BlockType::NegativeSpace, 1);
        assert!(matcher.matches(&cache, BlockState::new(BlockType::NegativeSpace, 1)));
        assert!(!matcher.matches(&cache, BlockState::new(BlockType::NegativeSpace, 0)));
        assert!(!matcher.matches(&cache, BlockState::new(BlockType::Stone, 1)));
    }

    #[test]
    fn test_block_metadata_ranges() {
        let cache = ExpressionCache::new();
        let matcher = BlockMatcher::new("stone & #1-3,7");
        assert!(matcher.matches(&cache, BlockState::new(BlockType::Stone, 2)));
        assert!(matcher.matches(&cache, BlockState::new(BlockType::Stone, 7)));
        assert!(!matcher.matches(&cache, BlockState::new(BlockType::Stone, 0)));
    }

    #[test]
    fn test_stable_across_repeated_evaluations() {
        let cache = ExpressionCache::new();
        let matcher = BiomeMatcher::new("$COLD | Swamp");
        for _ in 0..3 {
            assert!(matcher.matches(&cache, Biome::Tundra));
            assert!(matcher.matches(&cache, Biome::Swamp));
            assert!(!matcher.matches(&cache, Biome::Desert));
        }
        assert_eq!(cache.len(), 1);
    }
}
