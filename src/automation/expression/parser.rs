//! Recursive-descent parser producing the condition AST.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or      := and (("||" | "or") and)*
//! and     := not (("&&" | "and") not)*
//! not     := ("!" | "not") not | compare
//! compare := primary (("==" | "!=" | "<" | "<=" | ">" | ">=") primary)?
//! primary := literal | path | call | "(" or ")" | "[" (or ("," or)*)? "]"
//! path    := root ("." ident)*
//! call    := builtin "(" (or ("," or)*)? ")"
//! ```

use super::lexer::{Token, TokenKind};
use super::{ExpressionError, Value};

const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Expr {
    Literal(Value),
    Path(Vec<String>),
    List(Vec<Expr>),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        builtin: Builtin,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Builtin {
    Now,
    Has,
    In,
    AgeDays,
}

impl Builtin {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "now" => Some(Self::Now),
            "has" => Some(Self::Has),
            "in" => Some(Self::In),
            "age_days" => Some(Self::AgeDays),
            _ => None,
        }
    }

    const fn arity(self) -> usize {
        match self {
            Self::Now => 0,
            Self::Has | Self::AgeDays => 1,
            Self::In => 2,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::Has => "has",
            Self::In => "in",
            Self::AgeDays => "age_days",
        }
    }
}

pub(super) struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    depth: usize,
    roots: &'a [&'a str],
    source_len: usize,
}

impl<'a> Parser<'a> {
    pub(super) const fn new(tokens: &'a [Token], roots: &'a [&'a str], source_len: usize) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            roots,
            source_len,
        }
    }

    pub(super) fn parse(mut self) -> Result<Expr, ExpressionError> {
        if self.tokens.is_empty() {
            return Err(ExpressionError::parse(0, "expression is empty"));
        }
        let expr = self.parse_or()?;
        if let Some(token) = self.peek() {
            return Err(ExpressionError::parse(
                token.offset,
                format!("unexpected {}", token.kind.describe()),
            ));
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|token| token.kind == *kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ExpressionError> {
        if self.eat(kind) {
            return Ok(());
        }
        Err(self.unexpected(&format!("expected {}", kind.describe())))
    }

    fn unexpected(&self, context: &str) -> ExpressionError {
        match self.peek() {
            Some(token) => ExpressionError::parse(
                token.offset,
                format!("{context}, found {}", token.kind.describe()),
            ),
            None => ExpressionError::parse(self.source_len, format!("{context}, found end of input")),
        }
    }

    fn enter(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let offset = self.peek().map_or(self.source_len, |token| token.offset);
            return Err(ExpressionError::parse(offset, "expression nests too deeply"));
        }
        Ok(())
    }

    const fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        self.enter()?;
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        self.leave();
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat(&TokenKind::Not) {
            self.enter()?;
            let operand = self.parse_not()?;
            self.leave();
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.parse_primary()?;
        let op = match self.peek().map(|token| &token.kind) {
            Some(TokenKind::Eq) => BinaryOp::Eq,
            Some(TokenKind::Ne) => BinaryOp::Ne,
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::Le) => BinaryOp::Le,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.position += 1;
        let right = self.parse_primary()?;
        Ok(binary(op, left, right))
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self
            .advance()
            .ok_or_else(|| ExpressionError::parse(self.source_len, "unexpected end of input"))?;
        match &token.kind {
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Null => Ok(Expr::Literal(Value::Null)),
            TokenKind::Number(value) => Ok(Expr::Literal(Value::Number(*value))),
            TokenKind::Text(value) => Ok(Expr::Literal(Value::Text(value.clone()))),
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                let items = self.parse_items(&TokenKind::RBracket)?;
                Ok(Expr::List(items))
            }
            TokenKind::Ident(name) => {
                if self.eat(&TokenKind::LParen) {
                    self.parse_call(name, token.offset)
                } else {
                    self.parse_path(name, token.offset)
                }
            }
            other => Err(ExpressionError::parse(
                token.offset,
                format!("unexpected {}", other.describe()),
            )),
        }
    }

    fn parse_items(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ExpressionError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_or()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&TokenKind::Comma)?;
        }
    }

    fn parse_call(&mut self, name: &str, offset: usize) -> Result<Expr, ExpressionError> {
        let builtin = Builtin::lookup(name)
            .ok_or_else(|| ExpressionError::parse(offset, format!("unknown function '{name}'")))?;
        let args = self.parse_items(&TokenKind::RParen)?;
        if args.len() != builtin.arity() {
            return Err(ExpressionError::parse(
                offset,
                format!(
                    "{}() takes {} argument(s), got {}",
                    builtin.name(),
                    builtin.arity(),
                    args.len()
                ),
            ));
        }
        if builtin == Builtin::Has && !matches!(args.first(), Some(Expr::Path(_))) {
            return Err(ExpressionError::parse(offset, "has() expects a field path"));
        }
        Ok(Expr::Call { builtin, args })
    }

    fn parse_path(&mut self, root: &str, offset: usize) -> Result<Expr, ExpressionError> {
        if !self.roots.contains(&root) {
            return Err(ExpressionError::parse(
                offset,
                format!(
                    "unknown root '{root}', expected one of: {}",
                    self.roots.join(", ")
                ),
            ));
        }
        let mut segments = vec![root.to_owned()];
        while self.eat(&TokenKind::Dot) {
            match self.advance().map(|token| &token.kind) {
                Some(TokenKind::Ident(segment)) => segments.push(segment.clone()),
                _ => return Err(ExpressionError::parse(offset, "expected field name after '.'")),
            }
        }
        Ok(Expr::Path(segments))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
