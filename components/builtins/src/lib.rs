//! The standard builtin table.
//!
//! Global functions callable from any script (`len`, `type`, `print`,
//! conversions, collection helpers) plus the `math`, `json`, and `time`
//! module values. A compile session fixes the table order at creation;
//! the machine receives the values in that same order, so the two
//! functions here must stay aligned and [`builtin_names`] derives the
//! names directly from the table.
//!
//! # Example
//!
//! ```
//! use object_system::{ExecEnv, RunContext, Value};
//!
//! let names = builtins::builtin_names();
//! let table = builtins::default_builtins();
//! assert_eq!(names.len(), table.len());
//!
//! let position = names.iter().position(|name| name == "sprintf").unwrap();
//! let ctx = RunContext::new();
//! let mut env = ExecEnv::new(&ctx);
//! let result = match &table[position] {
//!     Value::Builtin(f) => f.call(&mut env, &[Value::string("%d fjords"), Value::Int(3)]),
//!     other => panic!("unexpected table entry: {other:?}"),
//! };
//! assert_eq!(result, Value::string("3 fjords"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod format;
pub mod globals;
pub mod json;
pub mod math;
pub mod time;

use object_system::{Builtin, Value};

/// The default builtin table, in table order.
pub fn default_builtins() -> Vec<Value> {
    vec![
        Value::builtin(Builtin::new("len", globals::len)),
        Value::builtin(Builtin::new("type", globals::type_of)),
        Value::builtin(Builtin::new("print", globals::print)),
        Value::builtin(Builtin::new("printf", globals::printf)),
        Value::builtin(Builtin::new("sprintf", globals::sprintf)),
        Value::builtin(Builtin::new("error", globals::error)),
        Value::builtin(Builtin::new("try", globals::try_call)),
        Value::builtin(Builtin::new("iter", globals::iter)),
        Value::builtin(Builtin::new("list", globals::list)),
        Value::builtin(Builtin::new("map", globals::map)),
        Value::builtin(Builtin::new("set", globals::set)),
        Value::builtin(Builtin::new("string", globals::string)),
        Value::builtin(Builtin::new("int", globals::int)),
        Value::builtin(Builtin::new("float", globals::float)),
        Value::builtin(Builtin::new("byte", globals::byte)),
        Value::builtin(Builtin::new("bytes", globals::bytes)),
        Value::builtin(Builtin::new("keys", globals::keys)),
        Value::builtin(Builtin::new("chr", globals::chr)),
        Value::builtin(Builtin::new("ord", globals::ord)),
        Value::builtin(Builtin::new("sorted", globals::sorted)),
        Value::builtin(Builtin::new("reversed", globals::reversed)),
        Value::builtin(Builtin::new("getattr", globals::getattr)),
        Value::builtin(Builtin::new("call", globals::call)),
        Value::builtin(Builtin::new("coalesce", globals::coalesce)),
        Value::builtin(Builtin::new("assert", globals::assert)),
        Value::builtin(Builtin::new("any", globals::any)),
        Value::builtin(Builtin::new("all", globals::all)),
        Value::builtin(Builtin::new("delete", globals::delete)),
        Value::builtin(Builtin::new("partial", globals::partial)),
        Value::builtin(Builtin::new("regexp", globals::regexp)),
        math::module(),
        json::module(),
        time::module(),
    ]
}

/// The names of [`default_builtins`], index-aligned with the table.
pub fn builtin_names() -> Vec<String> {
    default_builtins()
        .iter()
        .map(|value| match value {
            Value::Builtin(b) => b.name().to_string(),
            Value::Module(m) => m.name().to_string(),
            other => other.type_name().to_string(),
        })
        .collect()
}
