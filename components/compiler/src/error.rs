//! Compile-time errors.

use object_system::FriendlyError;
use parser::Position;
use thiserror::Error;

/// An error produced while lowering a program to bytecode.
///
/// Compile errors carry the source position of the offending node, like
/// [`parser::ParseError`] does for syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    message: String,
    position: Position,
}

impl CompileError {
    pub(crate) fn new(message: impl Into<String>, position: Position) -> Self {
        Self { message: message.into(), position }
    }

    /// The error description, without position information.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where in the source the error was detected.
    pub fn position(&self) -> Position {
        self.position
    }
}

impl FriendlyError for CompileError {
    fn friendly_message(&self) -> String {
        format!("compile error: {} ({})", self.message, self.position)
    }
}
