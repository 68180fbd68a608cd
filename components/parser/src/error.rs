//! Parse error type and helpers.

use object_system::FriendlyError;
use thiserror::Error;

use crate::lexer::{Position, Token};

/// Error produced by the lexer or parser. The plain `Display` form is
/// the bare message; `friendly_message` adds the source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
    position: Position,
}

impl ParseError {
    /// Create a parse error at the given position.
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self { message: message.into(), position }
    }

    /// The bare error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the error occurred.
    pub fn position(&self) -> Position {
        self.position
    }
}

impl FriendlyError for ParseError {
    fn friendly_message(&self) -> String {
        format!("parse error: {} ({})", self.message, self.position)
    }
}

/// Create a syntax error at a given position
pub(crate) fn syntax_error(message: impl Into<String>, position: Position) -> ParseError {
    ParseError::new(message, position)
}

/// Create an "expected X, got Y" error; expected is pre-quoted by the
/// caller ("')'", "an expression", ...)
pub(crate) fn unexpected_token(expected: &str, got: &Token, position: Position) -> ParseError {
    let got = match got {
        Token::EOF => "end of input".to_string(),
        other => format!("'{other}'"),
    };
    syntax_error(format!("expected {expected}, got {got}"), position)
}
