//! Bytecode Compiler Component
//!
//! Lowers parsed programs to the stack-machine bytecode executed by the
//! interpreter. A [`Compiler`] is an incremental session used by the
//! REPL: each pass appends to the accumulated main stream and returns a
//! complete [`bytecode_system::Code`] snapshot.
//!
//! # Overview
//!
//! - [`Compiler`] / [`CompilerOptions`] - Incremental compile session
//! - [`compile`] - One-shot compilation with the default builtins
//! - [`SymbolTable`] - Scoped global/local/free/builtin resolution
//! - [`CompileError`] - Lowering errors with source positions
//!
//! # Example
//!
//! ```
//! use compiler::{Compiler, CompilerOptions};
//!
//! let mut session = Compiler::new(CompilerOptions { builtins: vec![] });
//! let program = parser::parse("x := 1\nx + 1").unwrap();
//! let code = session.compile(&program).unwrap();
//! assert_eq!(code.globals, ["x"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod error;
pub mod symbols;

pub use compiler::{compile, Compiler, CompilerOptions};
pub use error::CompileError;
pub use symbols::{FreeVariable, FunctionScope, Symbol, SymbolScope, SymbolTable};
