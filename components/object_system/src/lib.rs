//! Dynamically typed runtime values and their behavior.
//!
//! This crate is the object model under the virtual machine: the value
//! catalog, operator semantics, hashing and ordering, container access,
//! iteration, attribute resolution, and the execution context types that
//! carry cancellation and cost budgets through a run.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of every script value
//! - [`RuntimeError`] / [`ExecError`] - Script-visible and host-level failures
//! - [`RunContext`] / [`CancelToken`] - Cancellation, deadline, and budget
//! - [`Builtin`] / [`ExecEnv`] - Host functions callable from scripts
//! - [`HashKey`] - Derived key under which values enter maps and sets
//! - [`ProxyTypeBuilder`] / [`new_proxy`] - Host objects exposed to scripts
//!
//! # Example
//!
//! ```
//! use bytecode_system::BinaryOp;
//! use object_system::Value;
//!
//! let sum = Value::Int(40).run_operation(BinaryOp::Add, &Value::Int(2));
//! assert_eq!(sum, Value::Int(42));
//!
//! let list = Value::list(vec![sum, Value::string("fjord")]);
//! assert_eq!(list.inspect(), "[42, \"fjord\"]");
//! assert_eq!(list.len().unwrap(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attrs;
mod compare;
mod container;
pub mod context;
pub mod errors;
pub mod hash;
pub mod iter;
pub mod map;
mod ops;
pub mod proxy;
pub mod value;

// Re-export main types at crate root
pub use attrs::{resolve_attr, AttrResolver};
pub use compare::compare_types;
pub use container::Slice;
pub use context::{Builtin, BuiltinFn, CallDispatcher, CancelToken, ExecEnv, RunContext};
pub use errors::{ErrorKind, ExecError, FriendlyError, RuntimeError};
pub use hash::HashKey;
pub use iter::IterEntry;
pub use map::{MapValue, SetValue};
pub use proxy::{
    new_proxy, register_proxy_type, FromValue, ProxyObject, ProxyType, ProxyTypeBuilder,
};
pub use value::{Function, Module, Partial, RegexpValue, Type, Value};
