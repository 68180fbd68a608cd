//! fjord CLI library
//!
//! Provides the Runtime struct and supporting modules for the fjord
//! binary: argument parsing, the REPL, and error plumbing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod repl;
pub mod runtime;

pub use cli::{Cli, OutputFormat};
pub use error::{CliError, CliResult};
pub use runtime::Runtime;
