use thiserror::Error;

/// Parse failure for a matcher expression. Raised at template load time;
/// evaluation is never attempted against an unparsable expression.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum ExpressionError {
    #[error("unexpected token `{token}` at position {position} in expression `{expression}`")]
    UnexpectedToken {
        expression: String,
        token: String,
        position: usize,
    },
    #[error("unexpected end of expression `{expression}`")]
    UnexpectedEnd { expression: String },
}

/// Parsed boolean expression. Immutable once built; shared between
/// evaluations through the expression cache.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    Constant(bool),
    Variable(String),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
}

impl Node {
    /// Parses `expression` into an AST. A blank expression parses to the
    /// constant `true` ("matches anything"), matching how authors leave
    /// rules unrestricted.
    pub fn parse(expression: &str) -> Result<Node, ExpressionError> {
        let tokens = tokenize(expression);
        if tokens.is_empty() {
            return Ok(Node::Constant(true));
        }

        let mut parser = Parser {
            expression,
            tokens,
            index: 0,
        };
        let node = parser.parse_or()?;
        if let Some((position, token)) = parser.peek() {
            return Err(ExpressionError::UnexpectedToken {
                expression: expression.to_string(),
                token: token.text(),
                position,
            });
        }
        Ok(node)
    }

    pub fn evaluate(&self, variable: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Node::Constant(value) => *value,
            Node::Variable(token) => variable(token),
            Node::Not(inner) => !inner.evaluate(variable),
            Node::And(children) => children.iter().all(|c| c.evaluate(variable)),
            Node::Or(children) => children.iter().any(|c| c.evaluate(variable)),
        }
    }

    /// Calls `visit` for every variable token in the expression.
    pub fn visit_variables(&self, visit: &mut dyn FnMut(&str)) {
        match self {
            Node::Constant(_) => {}
            Node::Variable(token) => visit(token),
            Node::Not(inner) => inner.visit_variables(visit),
            Node::And(children) | Node::Or(children) => {
                for child in children {
                    child.visit_variables(visit);
                }
            }
        }
    }

    /// Renders the expression back to a string, passing every variable
    /// token through `variable` (used to mark unknown tokens).
    pub fn render(&self, variable: &dyn Fn(&str) -> String) -> String {
        self.render_with_precedence(variable, 0)
    }

    fn precedence(&self) -> u8 {
        match self {
            Node::Or(_) => 0,
            Node::And(_) => 1,
            Node::Not(_) => 2,
            Node::Constant(_) | Node::Variable(_) => 3,
        }
    }

    fn render_with_precedence(&self, variable: &dyn Fn(&str) -> String, outer: u8) -> String {
        let rendered = match self {
            Node::Constant(true) => "".to_string(),
            Node::Constant(false) => "!".to_string(),
            Node::Variable(token) => variable(token),
            Node::Not(inner) => format!("!{}", inner.render_with_precedence(variable, 2)),
            Node::And(children) => children
                .iter()
                .map(|c| c.render_with_precedence(variable, 1))
                .collect::<Vec<_>>()
                .join(" & "),
            Node::Or(children) => children
                .iter()
                .map(|c| c.render_with_precedence(variable, 0))
                .collect::<Vec<_>>()
                .join(" | "),
        };

        if self.precedence() < outer {
            format!("({rendered})")
        } else {
            rendered
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
enum Token {
    Atom(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Atom(text) => text.clone(),
            Token::And => "&".to_string(),
            Token::Or => "|".to_string(),
            Token::Not => "!".to_string(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
        }
    }
}

fn tokenize(expression: &str) -> Vec<(usize, Token)> {
    let mut tokens = Vec::new();
    let mut atom_start: Option<usize> = None;
    let mut atom = String::new();

    let mut flush = |tokens: &mut Vec<(usize, Token)>, start: &mut Option<usize>, atom: &mut String| {
        if let Some(position) = start.take() {
            tokens.push((position, Token::Atom(std::mem::take(atom))));
        }
    };

    for (position, c) in expression.char_indices() {
        let symbol = match c {
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            '!' => Some(Token::Not),
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            _ => None,
        };

        if let Some(token) = symbol {
            flush(&mut tokens, &mut atom_start, &mut atom);
            tokens.push((position, token));
        } else if c.is_whitespace() {
            flush(&mut tokens, &mut atom_start, &mut atom);
        } else {
            if atom_start.is_none() {
                atom_start = Some(position);
            }
            atom.push(c);
        }
    }
    flush(&mut tokens, &mut atom_start, &mut atom);

    tokens
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<(usize, Token)>,
    index: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<(usize, &Token)> {
        self.tokens.get(self.index).map(|(p, t)| (*p, t))
    }

    fn advance(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Node, ExpressionError> {
        let first = self.parse_and()?;
        if !matches!(self.peek(), Some((_, Token::Or))) {
            return Ok(first);
        }

        let mut children = vec![first];
        while matches!(self.peek(), Some((_, Token::Or))) {
            self.advance();
            children.push(self.parse_and()?);
        }
        Ok(Node::Or(children))
    }

    fn parse_and(&mut self) -> Result<Node, ExpressionError> {
        let first = self.parse_unary()?;
        if !matches!(self.peek(), Some((_, Token::And))) {
            return Ok(first);
        }

        let mut children = vec![first];
        while matches!(self.peek(), Some((_, Token::And))) {
            self.advance();
            children.push(self.parse_unary()?);
        }
        Ok(Node::And(children))
    }

    fn parse_unary(&mut self) -> Result<Node, ExpressionError> {
        match self.advance() {
            Some((_, Token::Not)) => Ok(Node::Not(Box::new(self.parse_unary()?))),
            Some((_, Token::Open)) => {
                let inner = self.parse_or()?;
                match self.advance() {
                    Some((_, Token::Close)) => Ok(inner),
                    Some((position, token)) => Err(ExpressionError::UnexpectedToken {
                        expression: self.expression.to_string(),
                        token: token.text(),
                        position,
                    }),
                    None => Err(ExpressionError::UnexpectedEnd {
                        expression: self.expression.to_string(),
                    }),
                }
            }
            Some((_, Token::Atom(text))) => Ok(Node::Variable(text)),
            Some((position, token)) => Err(ExpressionError::UnexpectedToken {
                expression: self.expression.to_string(),
                token: token.text(),
                position,
            }),
            None => Err(ExpressionError::UnexpectedEnd {
                expression: self.expression.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str, truthy: &[&str]) -> bool {
        Node::parse(expression)
            .unwrap()
            .evaluate(&|token| truthy.contains(&token))
    }

    #[test]
    fn test_single_variable() {
        assert!(eval("Plains", &["Plains"]));
        assert!(!eval("Plains", &["Forest"]));
    }

    #[test]
    fn test_conjunction_requires_both() {
        assert!(!eval("$PLAINS & $FOREST", &["$PLAINS"]));
        assert!(eval("$PLAINS & $FOREST", &["$PLAINS", "$FOREST"]));
    }

    #[test]
    fn test_negation_binds_tightest() {
        assert!(eval("!A & B", &["B"]));
        assert!(!eval("!A & B", &["A", "B"]));
        assert!(eval("!(A & B)", &["A"]));
    }

    #[test]
    fn test_or_precedence() {
        // A | B & C == A | (B & C)
        assert!(eval("A | B & C", &["A"]));
        assert!(!eval("A | B & C", &["B"]));
        assert!(eval("A | B & C", &["B", "C"]));
    }

    #[test]
    fn test_blank_expression_is_true() {
        assert!(eval("", &[]));
        assert!(eval("   ", &[]));
    }

    #[test]
    fn test_parse_errors_carry_expression() {
        match Node::parse("A & & B") {
            Err(ExpressionError::UnexpectedToken {
                expression, token, ..
            }) => {
                assert_eq!(expression, "A & & B");
                assert_eq!(token, "&");
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        match Node::parse("A &") {
            Err(ExpressionError::UnexpectedEnd { expression }) => {
                assert_eq!(expression, "A &");
            }
            other => panic!("expected parse error, got {other:?}"),
        }

        assert!(Node::parse("(A | B").is_err());
        assert!(Node::parse("A B").is_err());
    }

    #[test]
    fn test_render_round_trip() {
        let node = Node::parse("!(A | B) & C").unwrap();
        assert_eq!(node.render(&|t| t.to_string()), "!(A | B) & C");
    }
}
