use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::matcher::algebra::{ExpressionError, Node};

static GLOBAL_CACHE: Lazy<ExpressionCache> = Lazy::new(ExpressionCache::new);

/// Shared parse cache: each distinct expression string is parsed once and
/// the resulting AST reused for every evaluation. Safe for concurrent use
/// from parallel world-generation workers; the write lock is only taken on
/// first sight of an expression.
pub struct ExpressionCache {
    parsed: RwLock<FxHashMap<String, Arc<Node>>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self {
            parsed: RwLock::new(FxHashMap::default()),
        }
    }

    /// Process-wide default cache for callers that do not inject their own.
    pub fn global() -> &'static ExpressionCache {
        &GLOBAL_CACHE
    }

    pub fn parse(&self, expression: &str) -> Result<Arc<Node>, ExpressionError> {
        if let Some(node) = self.parsed.read().get(expression) {
            return Ok(node.clone());
        }

        let node = Arc::new(Node::parse(expression)?);
        // Two threads may race to parse the same string; both produce the
        // same AST, so keep whichever entry landed first.
        let mut parsed = self.parsed.write();
        Ok(parsed
            .entry(expression.to_string())
            .or_insert(node)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.parsed.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.read().is_empty()
    }
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new()
    }
}
