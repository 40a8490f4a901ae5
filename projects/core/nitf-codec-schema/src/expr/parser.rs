//! Recursive-descent parser producing a typed expression tree.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expression  := disjunction [ "if" disjunction "else" expression ]
//! disjunction := conjunction ( "or" conjunction )*
//! conjunction := inversion ( "and" inversion )*
//! inversion   := "not" inversion | comparison
//! comparison  := sum [ compare_op sum | ["not"] "in" tuple ]
//! sum         := term ( ("+" | "-") term )*
//! term        := factor ( ("*" | "//" | "%") factor )*
//! factor      := "-" factor | primary
//! primary     := INT | FLOAT | STRING | "f" "." NAME ( "[" expression "]" )*
//!              | "i" DIGITS | "(" expression ")"
//! tuple       := "(" expression ( "," expression )* [","] ")"
//! ```

use super::lexer::{tokenize, Spanned, Token};
use super::ExpressionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    FloorDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    /// `f.name[..][..]`
    Field {
        name: String,
        subscripts: Vec<Expr>,
    },
    /// `iN`, stored as the 1-based loop level `N`
    LoopIndex(usize),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Membership {
        negated: bool,
        needle: Box<Expr>,
        haystack: Vec<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// Visits this node and all of its children, parents first.
    pub(crate) fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::LoopIndex(_) => {}
            Expr::Field { subscripts, .. } => subscripts.iter().for_each(|s| s.visit(f)),
            Expr::Neg(inner) | Expr::Not(inner) => inner.visit(f),
            Expr::Binary(_, lhs, rhs) | Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                lhs.visit(f);
                rhs.visit(f);
            }
            Expr::Membership {
                needle, haystack, ..
            } => {
                needle.visit(f);
                haystack.iter().for_each(|h| h.visit(f));
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.visit(f);
                then.visit(f);
                otherwise.visit(f);
            }
        }
    }
}

pub(crate) fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
        depth: 0,
    };
    let expr = parser.expression()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(extra) => Err(ExpressionError::Syntax {
            offset: extra.offset,
            message: "unexpected trailing input".into(),
        }),
    }
}

/// Deepest allowed chain of parentheses, subscripts, `not` and unary minus.
const MAX_NESTING: usize = 256;

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.offset)
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::Syntax {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ExpressionError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name == keyword)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Runs `parse` one nesting level deeper, failing once [`MAX_NESTING`] is reached.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ExpressionError>,
    ) -> Result<T, ExpressionError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expression(&mut self) -> Result<Expr, ExpressionError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, ExpressionError> {
        let value = self.disjunction()?;
        if !self.eat_keyword("if") {
            return Ok(value);
        }
        let condition = self.disjunction()?;
        if !self.eat_keyword("else") {
            return Err(self.error("expected `else`"));
        }
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(value),
            otherwise: Box::new(otherwise),
        })
    }

    fn disjunction(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.conjunction()?;
        while self.eat_keyword("or") {
            let rhs = self.conjunction()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn conjunction(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.inversion()?;
        while self.eat_keyword("and") {
            let rhs = self.inversion()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn inversion(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat_keyword("not") {
            let inner = self.nested(Self::inversion)?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ExpressionError> {
        let lhs = self.sum()?;

        let op = match self.peek() {
            Some(Token::EqEq) => Some(BinaryOp::Eq),
            Some(Token::NotEq) => Some(BinaryOp::Ne),
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Le) => Some(BinaryOp::Le),
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::Ge) => Some(BinaryOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let rhs = self.sum()?;
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)));
        }

        let negated = if self.is_keyword("not") {
            // `not` here can only start `not in`
            self.pos += 1;
            if !self.eat_keyword("in") {
                return Err(self.error("expected `in` after `not`"));
            }
            true
        } else if self.eat_keyword("in") {
            false
        } else {
            return Ok(lhs);
        };

        let haystack = self.tuple()?;
        Ok(Expr::Membership {
            negated,
            needle: Box::new(lhs),
            haystack,
        })
    }

    fn tuple(&mut self) -> Result<Vec<Expr>, ExpressionError> {
        self.expect(Token::LParen, "`(` to start a tuple")?;
        let mut items = vec![self.expression()?];
        while self.eat(&Token::Comma) {
            if self.peek() == Some(&Token::RParen) {
                break;
            }
            items.push(self.expression()?);
        }
        self.expect(Token::RParen, "`)` to close the tuple")?;
        Ok(items)
    }

    fn sum(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, ExpressionError> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::SlashSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.factor()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn factor(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat(&Token::Minus) {
            let inner = self.nested(Self::factor)?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Int(i)) => Ok(Expr::Int(i)),
            Some(Token::Float(v)) => Ok(Expr::Float(v)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) if name == "f" => self.field_access(),
            Some(Token::Ident(name)) => match loop_level(&name) {
                Some(level) => Ok(Expr::LoopIndex(level)),
                None => Err(ExpressionError::Syntax {
                    offset,
                    message: format!(
                        "unknown identifier `{name}`, only `f.<field>` and loop indices `i1`..`iN` are available"
                    ),
                }),
            },
            Some(_) => Err(ExpressionError::Syntax {
                offset,
                message: "expected a value".into(),
            }),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn field_access(&mut self) -> Result<Expr, ExpressionError> {
        self.expect(Token::Dot, "`.` after `f`")?;
        let name = match self.advance() {
            Some(Token::Ident(name)) => name,
            _ => return Err(self.error("expected a field name after `f.`")),
        };
        let mut subscripts = Vec::new();
        while self.eat(&Token::LBracket) {
            subscripts.push(self.expression()?);
            self.expect(Token::RBracket, "`]`")?;
        }
        Ok(Expr::Field { name, subscripts })
    }
}

/// Parses `i1`, `i2`, ... into the loop level. `i0` is not a valid level.
fn loop_level(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('i')?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn field(name: &str) -> Expr {
        Expr::Field {
            name: name.into(),
            subscripts: vec![],
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Int(1)),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Int(2)),
                    Box::new(Expr::Int(3))
                ))
            )
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = parse("f.a == 1 or f.b == 2 and f.c == 3").unwrap();
        assert!(matches!(parsed, Expr::Or(_, rhs) if matches!(*rhs, Expr::And(_, _))));
    }

    #[test]
    fn parses_subscripted_field() {
        assert_eq!(
            parse("f.nxpts[i1]").unwrap(),
            Expr::Field {
                name: "nxpts".into(),
                subscripts: vec![Expr::LoopIndex(1)],
            }
        );
    }

    #[test]
    fn parses_not_in_tuple() {
        assert_eq!(
            parse("f.ic not in ('NC', 'NM')").unwrap(),
            Expr::Membership {
                negated: true,
                needle: Box::new(field("ic")),
                haystack: vec![Expr::Str("NC".into()), Expr::Str("NM".into())],
            }
        );
    }

    #[test]
    fn parses_conditional_expression() {
        let parsed = parse("f.nbands if f.nbands > 0 else f.xbands").unwrap();
        assert!(matches!(parsed, Expr::Conditional { .. }));
    }

    #[test]
    fn rejects_unknown_identifiers() {
        assert!(matches!(
            parse("__import__"),
            Err(ExpressionError::Syntax { offset: 0, .. })
        ));
        assert!(parse("i0").is_err());
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(parse("f.a f.b").is_err());
    }

    #[test]
    fn rejects_empty_expression() {
        assert!(parse("").is_err());
    }

    #[rstest]
    #[case("(".repeat(10_000))]
    #[case("not ".repeat(10_000) + "1")]
    #[case("-".repeat(10_000) + "1")]
    #[case("f.a[".repeat(10_000))]
    fn rejects_excessive_nesting(#[case] source: String) {
        assert!(matches!(
            parse(&source),
            Err(ExpressionError::Syntax { message, .. }) if message == "nesting too deep"
        ));
    }

    #[test]
    fn accepts_moderate_nesting() {
        let source = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse(&source).unwrap(), Expr::Int(1));
        assert!(parse(&format!("{}f.a", "not ".repeat(50))).is_ok());
    }
}
