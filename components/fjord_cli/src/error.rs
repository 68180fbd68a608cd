//! Error types for the CLI

use compiler::CompileError;
use object_system::ExecError;
use parser::ParseError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Source failed to parse
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Source failed to compile
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Execution failed, including script errors nothing intercepted
    #[error(transparent)]
    Run(#[from] ExecError),

    /// REPL error
    #[error("{0}")]
    Repl(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
