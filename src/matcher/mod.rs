//! Boolean expression engine for generation rules
//! Expressions are authored as strings ("Plains | $FOREST & !#2"), parsed
//! once into a shared cache and evaluated against biomes, dimensions or
//! block states through prefix-dispatched variable types.

pub mod algebra;
pub mod cache;
pub mod matchers;
pub mod types;

// Re-export commonly used types
pub use algebra::{ExpressionError, Node};
pub use cache::ExpressionCache;
pub use matchers::{BiomeMatcher, BlockMatcher, DimensionMatcher};
pub use types::{ExpressionMatcher, VariableType};
