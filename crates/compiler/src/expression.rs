//! Expression parser
//!
//! Recursive descent over the token stream with three precedence
//! tiers, lowest first:
//!
//! ```text
//! expression     := comparison
//! comparison     := additive { ('=' | '<>' | '<' | '<=' | '>' | '>=') additive }
//! additive       := multiplicative { ('+' | '-') multiplicative }
//! multiplicative := primary { ('*' | '/') primary }
//! primary        := literal | '-' number | access | '(' expression ')'
//! access         := ('memory' | 'context' | 'message') { '.' ident }
//! ```
//!
//! All tiers are left-associative. A leading `-` is accepted on a
//! numeric literal only; there is no general unary negation.

use crate::ast::{BinaryOp, ExpressionAst, MemoryRoot};
use crate::error::ParseError;
use crate::token::{Cursor, TokenKind, tokenize};

/// Parse a complete expression; trailing input is an error.
pub fn parse_expression(source: &str) -> Result<ExpressionAst, ParseError> {
    let tokens = tokenize(source)?;
    let mut cursor = Cursor::new(tokens, source.len());
    let ast = parse(&mut cursor)?;
    cursor.expect_end()?;
    Ok(ast)
}

/// Parse one expression from a shared cursor, stopping at the first
/// token that cannot extend it (a comma or closing paren, typically).
pub(crate) fn parse(cursor: &mut Cursor) -> Result<ExpressionAst, ParseError> {
    parse_comparison(cursor)
}

fn parse_comparison(cursor: &mut Cursor) -> Result<ExpressionAst, ParseError> {
    let mut left = parse_additive(cursor)?;
    loop {
        let op = match cursor.peek().map(|t| &t.kind) {
            Some(TokenKind::Eq) => BinaryOp::Eq,
            Some(TokenKind::Ne) => BinaryOp::Ne,
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::Le) => BinaryOp::Le,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        cursor.advance();
        let right = parse_additive(cursor)?;
        left = ExpressionAst::Binary { op, left: Box::new(left), right: Box::new(right) };
    }
}

fn parse_additive(cursor: &mut Cursor) -> Result<ExpressionAst, ParseError> {
    let mut left = parse_multiplicative(cursor)?;
    loop {
        let op = match cursor.peek().map(|t| &t.kind) {
            Some(TokenKind::Plus) => BinaryOp::Add,
            Some(TokenKind::Minus) => BinaryOp::Sub,
            _ => return Ok(left),
        };
        cursor.advance();
        let right = parse_multiplicative(cursor)?;
        left = ExpressionAst::Binary { op, left: Box::new(left), right: Box::new(right) };
    }
}

fn parse_multiplicative(cursor: &mut Cursor) -> Result<ExpressionAst, ParseError> {
    let mut left = parse_primary(cursor)?;
    loop {
        let op = match cursor.peek().map(|t| &t.kind) {
            Some(TokenKind::Star) => BinaryOp::Mul,
            Some(TokenKind::Slash) => BinaryOp::Div,
            _ => return Ok(left),
        };
        cursor.advance();
        let right = parse_primary(cursor)?;
        left = ExpressionAst::Binary { op, left: Box::new(left), right: Box::new(right) };
    }
}

fn parse_primary(cursor: &mut Cursor) -> Result<ExpressionAst, ParseError> {
    let position = cursor.position();
    let Some(token) = cursor.advance() else {
        return Err(ParseError::new(position, "expected expression"));
    };

    match token.kind {
        TokenKind::Integer(value) => Ok(ExpressionAst::IntLiteral(value)),
        TokenKind::Double(value) => Ok(ExpressionAst::DoubleLiteral(value)),
        TokenKind::Str(value) => Ok(ExpressionAst::StringLiteral(value)),
        TokenKind::Minus => {
            let number_pos = cursor.position();
            match cursor.advance().map(|t| t.kind) {
                Some(TokenKind::Integer(value)) => Ok(ExpressionAst::IntLiteral(-value)),
                Some(TokenKind::Double(value)) => Ok(ExpressionAst::DoubleLiteral(-value)),
                _ => Err(ParseError::new(number_pos, "expected number after '-'")),
            }
        }
        TokenKind::LParen => {
            let inner = parse(cursor)?;
            if !cursor.eat(&TokenKind::RParen) {
                return Err(ParseError::new(cursor.position(), "expected ')'"));
            }
            Ok(inner)
        }
        TokenKind::Ident(name) => match MemoryRoot::from_ident(&name) {
            Some(root) => parse_access(cursor, root),
            None => Err(ParseError::new(
                position,
                format!("unknown identifier '{name}' (expected memory, context, or message)"),
            )),
        },
        other => Err(ParseError::new(
            position,
            format!("expected expression, found {}", other.describe()),
        )),
    }
}

/// Parse the `.ident` tail of a memory access. The root token has
/// already been consumed.
fn parse_access(cursor: &mut Cursor, root: MemoryRoot) -> Result<ExpressionAst, ParseError> {
    let mut path = Vec::new();
    while cursor.eat(&TokenKind::Dot) {
        let position = cursor.position();
        match cursor.advance().map(|t| t.kind) {
            Some(TokenKind::Ident(segment)) => path.push(segment),
            _ => return Err(ParseError::new(position, "expected identifier after '.'")),
        }
    }
    Ok(ExpressionAst::MemoryAccess { root, path })
}
