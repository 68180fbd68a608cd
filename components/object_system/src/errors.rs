//! Error types for script evaluation.
//!
//! Failures split into two layers. [`RuntimeError`] is the script-visible
//! payload: it travels inside `Value::Error`, can be produced by operators
//! and builtins, and can be intercepted by the `try` builtin. [`ExecError`]
//! is what a VM run returns to the host; a raised `RuntimeError` is only one
//! of its variants, alongside cancellation, deadline, budget, and internal
//! failures that scripts can never catch.

use thiserror::Error;

/// Classification of a script-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Plain error raised by script code, e.g. via the `error` builtin.
    Generic,
    /// Unsupported operation or operand type.
    Type,
    /// Sequence index out of range.
    Index,
    /// Missing map key.
    Key,
    /// Unknown or read-only attribute.
    Attr,
    /// Structurally valid operation with an invalid value.
    Value,
    /// Failure reported by host code behind a proxy or builtin.
    Host,
}

impl ErrorKind {
    /// Short name used in messages and by the `kind` attribute of error
    /// values.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Generic => "error",
            ErrorKind::Type => "type error",
            ErrorKind::Index => "index error",
            ErrorKind::Key => "key error",
            ErrorKind::Attr => "attribute error",
            ErrorKind::Value => "value error",
            ErrorKind::Host => "host error",
        }
    }
}

/// A script-visible error: a kind tag plus a fully rendered message.
///
/// The message carries its own prefix ("type error: ..."), so `Display`
/// is just the message. Errors compare by kind and message, which makes
/// error values behave as ordinary comparable data in scripts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    kind: ErrorKind,
    message: String,
}

impl RuntimeError {
    /// Create an error with an explicit kind. The message is stored as
    /// given; the convenience constructors below add the usual prefix.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// A plain error with no prefix, as produced by the `error` builtin.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic, message)
    }

    /// "type error: ..."
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, format!("type error: {}", message.into()))
    }

    /// "index error: ..."
    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Index, format!("index error: {}", message.into()))
    }

    /// "key error: ..."
    pub fn key_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Key, format!("key error: {}", message.into()))
    }

    /// "attribute error: ..."
    pub fn attr_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Attr, format!("attribute error: {}", message.into()))
    }

    /// "value error: ..."
    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, format!("value error: {}", message.into()))
    }

    /// "host error: ..." for failures crossing the proxy or dispatcher
    /// boundary.
    pub fn host(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Host, format!("host error: {}", message.into()))
    }

    /// Arity failure for a named callable, reported as a type error:
    /// `type error: len() takes exactly 1 argument (2 given)`.
    pub fn arity(name: &str, want: &str, got: usize) -> Self {
        let plural = if got == 1 { "" } else { "s" };
        Self::new(
            ErrorKind::Type,
            format!("type error: {name}() takes {want} ({got} argument{plural} given)"),
        )
    }

    /// The error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The full message, prefix included.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Host-level outcome of a failed VM run.
///
/// Only `Raised` corresponds to a script-level error; everything else
/// aborts execution unconditionally and is invisible to `try`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// A `RuntimeError` was raised and nothing intercepted it.
    #[error(transparent)]
    Raised(#[from] RuntimeError),
    /// The cancellation token was triggered.
    #[error("execution cancelled")]
    Cancelled,
    /// The deadline attached to the cancellation token passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The configured cost budget was exhausted.
    #[error("cost budget exceeded (limit {0})")]
    BudgetExceeded(usize),
    /// Call or operand stack grew past its fixed capacity.
    #[error("stack overflow")]
    StackOverflow,
    /// Invariant violation inside the VM; indicates a compiler or VM bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecError {
    /// Internal-error constructor used by the VM for malformed bytecode.
    pub fn internal(message: impl Into<String>) -> Self {
        ExecError::Internal(message.into())
    }
}

/// Errors that can present a position-annotated, human-oriented message
/// in addition to the plain `Display` form. Parse and compile errors
/// implement this for the CLI.
pub trait FriendlyError: std::error::Error {
    /// Multi-line message suitable for terminal display.
    fn friendly_message(&self) -> String;
}
