//! Recursive-descent arithmetic parser
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | IDENT | '(' expr ')'
//! ```

use super::lexer::{tokenize, Token, TokenKind};
use crate::error::DerivationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Arithmetic expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Field(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Parse an arithmetic formula
    ///
    /// Formulas nesting deeper than [`MAX_DEPTH`] (parentheses, signs or
    /// chained operators) are rejected with [`DerivationError::TooDeep`].
    pub fn parse(formula: &str) -> Result<Self, DerivationError> {
        let tokens = tokenize(formula)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            nesting: 0,
        };
        let node = parser.expr()?;
        match parser.peek() {
            None => Ok(node.expr),
            Some(token) => Err(unexpected(token)),
        }
    }

    /// Field ids referenced by this expression, in first-use order
    pub fn references(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references(&self, out: &mut Vec<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Field(id) => {
                if !out.contains(id) {
                    out.push(id.clone());
                }
            }
            Expr::Neg(inner) => inner.collect_references(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_references(out);
                rhs.collect_references(out);
            }
        }
    }

    /// Evaluate, resolving field references through `resolve`
    pub fn eval<F>(&self, resolve: &F) -> Result<f64, DerivationError>
    where
        F: Fn(&str) -> Result<f64, DerivationError>,
    {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Field(id) => resolve(id),
            Expr::Neg(inner) => Ok(-inner.eval(resolve)?),
            Expr::Binary { op, lhs, rhs } => {
                let a = lhs.eval(resolve)?;
                let b = rhs.eval(resolve)?;
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                })
            }
        }
    }
}

/// Upper bound on parser recursion and on the height of the parsed tree
pub const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// open parentheses and signs on the current descent
    nesting: usize,
}

/// Expression plus the height of its tree
struct Node {
    expr: Expr,
    depth: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, depth: 1 }
    }

    fn neg(inner: Node) -> Result<Self, DerivationError> {
        let depth = checked_depth(inner.depth + 1)?;
        Ok(Self {
            expr: Expr::Neg(Box::new(inner.expr)),
            depth,
        })
    }

    fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Result<Self, DerivationError> {
        let depth = checked_depth(lhs.depth.max(rhs.depth) + 1)?;
        Ok(Self {
            expr: Expr::Binary {
                op,
                lhs: Box::new(lhs.expr),
                rhs: Box::new(rhs.expr),
            },
            depth,
        })
    }
}

fn checked_depth(depth: usize) -> Result<usize, DerivationError> {
    if depth > MAX_DEPTH {
        Err(DerivationError::TooDeep { limit: MAX_DEPTH })
    } else {
        Ok(depth)
    }
}

fn unexpected(token: &Token) -> DerivationError {
    DerivationError::UnexpectedToken {
        token: token.kind.to_string(),
        position: token.position,
    }
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn descend(&mut self) -> Result<(), DerivationError> {
        self.nesting += 1;
        checked_depth(self.nesting).map(|_| ())
    }

    fn expr(&mut self) -> Result<Node, DerivationError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Node::binary(op, lhs, rhs)?;
        }
    }

    fn term(&mut self) -> Result<Node, DerivationError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Node::binary(op, lhs, rhs)?;
        }
    }

    fn unary(&mut self) -> Result<Node, DerivationError> {
        let negate = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Minus) => true,
            Some(TokenKind::Plus) => false,
            _ => return self.primary(),
        };
        self.pos += 1;
        self.descend()?;
        let inner = self.unary()?;
        self.nesting -= 1;
        if negate {
            Node::neg(inner)
        } else {
            Ok(inner)
        }
    }

    fn primary(&mut self) -> Result<Node, DerivationError> {
        let token = self.next().ok_or(DerivationError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::Number(n) => Ok(Node::leaf(Expr::Number(n))),
            TokenKind::Ident(id) => Ok(Node::leaf(Expr::Field(id))),
            TokenKind::LParen => {
                self.descend()?;
                let inner = self.expr()?;
                self.nesting -= 1;
                match self.next() {
                    Some(Token { kind: TokenKind::RParen, .. }) => Ok(inner),
                    Some(other) => Err(unexpected(&other)),
                    None => Err(DerivationError::UnexpectedEnd),
                }
            }
            _ => Err(unexpected(&token)),
        }
    }
}
