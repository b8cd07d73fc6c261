//! The token definition for the predicate query language.

use std::fmt;

/// A token is a single trimmed slice of the query, with a specific kind and location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Span,
}

/// The kind of a token.
///
/// Assigned once by the tokenizer so the parser never re-inspects token text
/// to find keywords or parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    And, // "and"
    Or,  // "or"
    Not, // "not"

    // Punctuation
    LParen, // (
    RParen, // )

    /// A symbolic operator from the configured operator list, e.g. `>=`.
    Operator,
    /// Attribute names, values, method-style operators and folded value groups.
    Text,
}

impl TokenKind {
    /// `and`, `or` and `not`.
    pub fn is_keyword(self) -> bool {
        matches!(self, TokenKind::And | TokenKind::Or | TokenKind::Not)
    }

    /// Whether this token ends the span of a predicate.
    pub fn ends_predicate(self) -> bool {
        matches!(self, TokenKind::And | TokenKind::Or | TokenKind::RParen)
    }
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
