use std::sync::Arc;

use crate::matcher::algebra::{ExpressionError, Node};
use crate::matcher::cache::ExpressionCache;

/// One vocabulary inside an expression, owning a token prefix. The empty
/// prefix denotes the default vocabulary. New variable types plug in
/// without touching the parser.
pub trait VariableType<S, U: ?Sized>: Send + Sync {
    fn prefix(&self) -> &str;

    /// Does `subject` satisfy this token?
    fn evaluate(&self, token: &str, subject: &S) -> bool;

    /// Does this token denote something that exists in `universe`? Used for
    /// diagnostics about stale or typo'd rules, never for evaluation.
    fn is_known(&self, token: &str, universe: &U) -> bool;
}

/// A parsed expression bound to its variable types, ready to evaluate
/// against subjects of type `S`.
pub struct ExpressionMatcher<S, U: ?Sized> {
    expression: String,
    node: Arc<Node>,
    empty_label: &'static str,
    types: Vec<Box<dyn VariableType<S, U>>>,
}

impl<S, U: ?Sized> ExpressionMatcher<S, U> {
    pub fn new(
        cache: &ExpressionCache,
        expression: &str,
        empty_label: &'static str,
        types: Vec<Box<dyn VariableType<S, U>>>,
    ) -> Result<Self, ExpressionError> {
        let node = cache.parse(expression)?;
        Ok(Self {
            expression: expression.to_string(),
            node,
            empty_label,
            types,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Splits a token into its variable type and bare name. The longest
    /// registered prefix wins, so `$` beats the default empty prefix.
    fn dispatch<'a>(&self, token: &'a str) -> Option<(&dyn VariableType<S, U>, &'a str)> {
        self.types
            .iter()
            .filter(|t| token.starts_with(t.prefix()))
            .max_by_key(|t| t.prefix().len())
            .map(|t| (t.as_ref(), &token[t.prefix().len()..]))
    }

    /// Evaluates against one subject. Unknown variables evaluate to false
    /// rather than erroring; see [`Self::contains_unknown_variables`].
    pub fn evaluate(&self, subject: &S) -> bool {
        self.node.evaluate(&|token| {
            self.dispatch(token)
                .is_some_and(|(t, name)| t.evaluate(name, subject))
        })
    }

    /// True if any variable does not resolve against `universe`. Such an
    /// expression silently never matches; tooling surfaces this separately.
    pub fn contains_unknown_variables(&self, universe: &U) -> bool {
        let mut unknown = false;
        self.node.visit_variables(&mut |token| {
            if !self
                .dispatch(token)
                .is_some_and(|(t, name)| t.is_known(name, universe))
            {
                unknown = true;
            }
        });
        unknown
    }

    /// Human-readable rendering; unknown variables are marked with a
    /// trailing `?`.
    pub fn describe(&self, universe: &U) -> String {
        if matches!(*self.node, Node::Constant(true)) {
            return self.empty_label.to_string();
        }

        self.node.render(&|token| {
            let known = self
                .dispatch(token)
                .is_some_and(|(t, name)| t.is_known(name, universe));
            if known {
                token.to_string()
            } else {
                format!("{token}?")
            }
        })
    }
}
