//! Bytecode Interpreter Component
//!
//! Provides the stack-based virtual machine that executes compiled code
//! snapshots.
//!
//! # Overview
//!
//! - [`Vm`] - Executes one `Arc<Code>` snapshot against a run context
//! - [`VmOptions`] - Builtin values, start offset, carried globals, and
//!   cost budget for a run
//! - Calls, closures, and partial application, with re-entry for
//!   builtins that invoke script callables
//! - Cancellation, deadline, and budget enforcement at jump, loop,
//!   call, and attribute checkpoints
//!
//! # Example
//!
//! ```
//! use interpreter::Vm;
//! use object_system::{RunContext, Value};
//!
//! let program = parser::parse("x := 40\nx + 2").unwrap();
//! let code = compiler::compile(&program).unwrap();
//!
//! let mut vm = Vm::new(code);
//! let result = vm.run(&RunContext::new()).unwrap();
//! assert_eq!(result, Value::Int(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod frame;
pub mod vm;

pub use vm::{Vm, VmOptions, MAX_FRAMES, MAX_STACK};
