//! Parser for the filter micro-language.

use std::fmt;

use super::token::{tokenize, Token, TokenKind};
use super::QueryError;

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Matches every record.
    Empty,
    /// `left <op> right`
    Comparison {
        /// Field name resolved against each record
        left: String,
        op: CompareOp,
        /// Literal compared by exact string equality
        right: String,
    },
    /// `left <op> right`, where `right` may itself be a conjugation.
    Conjugation {
        op: ConjOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
}

/// Conjunction operators. Both bind equally and group to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConjOp {
    /// `&`
    And,
    /// `|`
    Or,
}

/// Tokenize and parse a filter string.
pub fn parse_query(input: &str) -> Result<Expression, QueryError> {
    let tokens = tokenize(input)?;
    parse_tokens(&tokens)
}

/// Parse an already tokenized filter. No tokens yields [`Expression::Empty`].
pub fn parse_tokens(tokens: &[Token]) -> Result<Expression, QueryError> {
    if tokens.is_empty() {
        return Ok(Expression::Empty);
    }
    parse_expr(tokens)
}

/// `expr := comparison (conjOp expr)?`
fn parse_expr(tokens: &[Token]) -> Result<Expression, QueryError> {
    let Some((cmp, rest)) = tokens.split_first_chunk::<3>() else {
        return Err(QueryError::Incomplete(join_tokens(tokens)));
    };

    let left = parse_comparison(cmp)?;

    let Some((conj, rest)) = rest.split_first() else {
        return Ok(left);
    };

    let op = match conj.kind {
        TokenKind::And => ConjOp::And,
        TokenKind::Or => ConjOp::Or,
        _ => return Err(QueryError::InvalidConjunction(conj.text.clone())),
    };

    let right = parse_expr(rest)?;

    Ok(Expression::Conjugation {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// `comparison := Ident (Eq|Ne) Ident`
fn parse_comparison(tokens: &[Token; 3]) -> Result<Expression, QueryError> {
    let [field, op, value] = tokens;

    if field.kind != TokenKind::Ident || value.kind != TokenKind::Ident {
        return Err(QueryError::InvalidComparison(join_tokens(tokens)));
    }

    let op = match op.kind {
        TokenKind::Equal => CompareOp::Eq,
        TokenKind::NotEqual => CompareOp::Ne,
        _ => return Err(QueryError::InvalidComparison(join_tokens(tokens))),
    };

    Ok(Expression::Comparison {
        left: field.text.clone(),
        op,
        right: value.text.clone(),
    })
}

fn join_tokens(tokens: &[Token]) -> String {
    let parts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    format!("[{}]", parts.join(" "))
}

impl Expression {
    /// Check if this expression matches everything.
    pub fn is_match_all(&self) -> bool {
        matches!(self, Expression::Empty)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Empty => write!(f, "()"),
            Expression::Comparison { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Conjugation { op, left, right } => {
                // Parenthesize the right side so the grouping stays visible
                match right.as_ref() {
                    Expression::Conjugation { .. } => write!(f, "{} {} ({})", left, op, right),
                    _ => write!(f, "{} {} {}", left, op, right),
                }
            }
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Ne => write!(f, "!="),
        }
    }
}

impl fmt::Display for ConjOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConjOp::And => write!(f, "&"),
            ConjOp::Or => write!(f, "|"),
        }
    }
}
