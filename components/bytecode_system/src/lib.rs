//! Compiled bytecode for the fjord runtime.
//!
//! This crate defines the instruction set and the immutable compiled-code
//! artifacts shared between the compiler and the VM.
//!
//! # Overview
//!
//! - [`Instruction`] - Stack-machine instruction set with embedded operands
//! - [`BinaryOp`] - Binary operators dispatched through the object model
//! - [`Code`] - Immutable, `Send + Sync` snapshot of one compile pass
//! - [`FunctionUnit`] - A compiled function body
//! - [`Constant`] - Constant pool entries
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Code, Constant, Instruction};
//!
//! let mut code = Code::default();
//! code.constants.push(Constant::Int(42));
//! code.main.instructions.push(Instruction::LoadConst(0));
//! code.main.instructions.push(Instruction::ReturnValue);
//!
//! assert!(code.disassemble().contains("LOAD_CONST 0"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod code;
pub mod instruction;

// Re-export main types at crate root
pub use code::{Code, Constant, FunctionUnit};
pub use instruction::{BinaryOp, Instruction};
