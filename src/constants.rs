// Template format constants
pub const LATEST_TEMPLATE_VERSION: u64 = 3;

// Placement constants
pub const MAX_GENERATION_LAYERS: u32 = 30;
pub const PLACEMENT_PASSES: usize = 2;

// Matcher prefixes
pub const BIOME_CATEGORY_PREFIX: &str = "$";
pub const DIMENSION_TAG_PREFIX: &str = "#";
pub const BLOCK_METADATA_PREFIX: &str = "#";
