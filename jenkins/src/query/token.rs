//! Tokenizer for the filter micro-language.

use std::fmt;

use super::QueryError;

/// Kinds of token produced by [`tokenize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Field name or literal value (letters and digits)
    Ident,
    /// `&`
    And,
    /// `|`
    Or,
    /// `!=`
    NotEqual,
    /// `=`
    Equal,
}

/// A single token with its source text and byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the first character in the filter string.
    pub offset: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }

    fn ident(text: &str, offset: usize) -> Self {
        Self::new(TokenKind::Ident, text, offset)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Letters and digits, plus the `_`, `-` and `.` found in Jenkins parameter
/// names, agent names and version strings.
fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

/// Split a filter string into tokens.
///
/// Returns [`QueryError::Syntax`] carrying the byte offset of the first
/// character that cannot start a token. A `!` must be followed by `=`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, QueryError> {
    let mut tokens = Vec::new();
    // Start offset of the identifier currently being accumulated
    let mut ident_start: Option<usize> = None;
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        if is_ident_char(ch) {
            ident_start.get_or_insert(offset);
            continue;
        }

        // Anything else ends an in-progress identifier
        if let Some(start) = ident_start.take() {
            tokens.push(Token::ident(&input[start..offset], start));
        }

        match ch {
            c if c.is_whitespace() => {}
            '&' => tokens.push(Token::new(TokenKind::And, "&", offset)),
            '|' => tokens.push(Token::new(TokenKind::Or, "|", offset)),
            '=' => tokens.push(Token::new(TokenKind::Equal, "=", offset)),
            '!' => match chars.peek() {
                Some((_, '=')) => {
                    chars.next();
                    tokens.push(Token::new(TokenKind::NotEqual, "!=", offset));
                }
                _ => return Err(QueryError::Syntax { offset }),
            },
            _ => return Err(QueryError::Syntax { offset }),
        }
    }

    if let Some(start) = ident_start {
        tokens.push(Token::ident(&input[start..], start));
    }

    Ok(tokens)
}
