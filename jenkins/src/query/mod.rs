//! Filter micro-language for selecting builds.
//!
//! # Syntax Overview
//!
//! - **Comparison**: `field=value` or `field!=value`
//! - **Conjunction**: `expr & expr`, `expr | expr`
//! - **Empty**: an empty (or all-whitespace) filter matches everything
//!
//! Fields and values are runs of letters, digits, `_`, `-` and `.`; there
//! is no quoting.
//! Conjunctions group to the right with no precedence between `&` and `|`,
//! so `a=1 & b=2 | c=3` reads as `a=1 & (b=2 | c=3)`.

mod compile;
mod parser;
mod token;

pub use compile::{compile, FieldResolver, Predicate};
pub use parser::{parse_query, parse_tokens, CompareOp, ConjOp, Expression};
pub use token::{tokenize, Token, TokenKind};

/// Errors raised while tokenizing or parsing a filter string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Unrecognized character, or a `!` not followed by `=`.
    #[error("Syntax error at {offset}")]
    Syntax { offset: usize },

    /// The token stream ended where a comparison was expected.
    #[error("Invalid expression: {0}")]
    Incomplete(String),

    /// Three tokens in comparison position that are not `ident op ident`.
    #[error("Invalid comparison expression: {0}")]
    InvalidComparison(String),

    /// A token other than `&` or `|` following a comparison.
    #[error("Invalid conjugation operator: {0}")]
    InvalidConjunction(String),
}
