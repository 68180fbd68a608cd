//! Source Language Parser Component
//!
//! Provides the lexer, recursive descent parser, and AST for the
//! scripting language.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes source text, turning newlines into statement
//!   terminators the way Go does
//! - [`Token`] - Token types including identifiers, literals, keywords
//! - [`Parser`] - Recursive descent parser producing an AST
//! - [`Program`] / [`Statement`] / [`Expression`] - AST node types
//! - [`ParseError`] - Syntax errors with line and column positions
//!
//! # Example
//!
//! ```
//! use parser::parse;
//!
//! let program = parse("x := 41\nx + 1").unwrap();
//! assert_eq!(program.statements.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Expression, PrefixOperator, Program, Statement};
pub use error::ParseError;
pub use lexer::{Keyword, Lexer, Position, Punctuator, Token};
pub use parser::{parse, Parser};
