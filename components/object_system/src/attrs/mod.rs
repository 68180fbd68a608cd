//! Attribute resolution and the per-type method tables.
//!
//! Attribute access runs in two tiers. The static tier is
//! `Value::get_attr`: a fixed table per type, answered by the submodules
//! here, whose methods are builtins bound to the receiver at lookup
//! time. The dynamic tier is the [`AttrResolver`] capability, which
//! proxy values implement to dispatch into registered host types. The
//! free function [`resolve_attr`] is the access path the VM uses: static
//! table first, resolver on a miss, and a uniform "no attribute" error
//! when both come up empty.

use std::rc::Rc;

use crate::context::{Builtin, ExecEnv, RunContext};
use crate::errors::RuntimeError;
use crate::value::Value;

pub mod bytes;
pub mod list;
pub mod map;
pub mod regexp;
pub mod set;
pub mod string;
pub mod time;

/// Dynamic attribute resolution, implemented by proxy values.
pub trait AttrResolver {
    /// Resolve `name` on the receiver, or fail with an attribute error.
    fn resolve_attr(&self, ctx: &RunContext, name: &str) -> Result<Value, RuntimeError>;
}

/// Full attribute lookup: static table, then the value's resolver.
pub fn resolve_attr(value: &Value, ctx: &RunContext, name: &str) -> Result<Value, RuntimeError> {
    if let Some(found) = value.get_attr(name) {
        return Ok(found);
    }
    if let Some(resolver) = value.attr_resolver() {
        return resolver.resolve_attr(ctx, name);
    }
    Err(no_such_attr(value.type_name(), name))
}

/// The canonical "no attribute" error.
pub(crate) fn no_such_attr(type_name: &str, attr: &str) -> RuntimeError {
    RuntimeError::attr_error(format!("{type_name} object has no attribute {attr:?}"))
}

/// Wrap a fallible method body as a bound-method builtin. Errors come
/// back as error values, which the VM raises.
pub(crate) fn method(
    name: &'static str,
    body: impl Fn(&mut ExecEnv<'_>, &[Value]) -> Result<Value, RuntimeError> + 'static,
) -> Option<Value> {
    Some(Value::builtin(Builtin::new(name, move |env, args| {
        match body(env, args) {
            Ok(value) => value,
            Err(err) => Value::error(err),
        }
    })))
}

/// Check for an exact argument count.
pub(crate) fn exact_args(method: &str, want: usize, args: &[Value]) -> Result<(), RuntimeError> {
    if args.len() == want {
        return Ok(());
    }
    let want_desc = match want {
        0 => "no arguments".to_string(),
        1 => "exactly 1 argument".to_string(),
        n => format!("exactly {n} arguments"),
    };
    Err(RuntimeError::arity(method, &want_desc, args.len()))
}

/// Check for an argument count within `min..=max`.
pub(crate) fn bounded_args(
    method: &str,
    min: usize,
    max: usize,
    args: &[Value],
) -> Result<(), RuntimeError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let want_desc = if min == 0 {
        format!("at most {max} argument{}", if max == 1 { "" } else { "s" })
    } else {
        format!("{min} or {max} arguments")
    };
    Err(RuntimeError::arity(method, &want_desc, args.len()))
}

/// A positional argument that must be a string.
pub(crate) fn str_arg(method: &str, args: &[Value], index: usize) -> Result<Rc<str>, RuntimeError> {
    match &args[index] {
        Value::String(s) => Ok(s.clone()),
        other => Err(RuntimeError::type_error(format!(
            "{method}() expected a string argument (got {})",
            other.type_name()
        ))),
    }
}

/// A positional argument that must be callable.
pub(crate) fn callable_arg(
    method: &str,
    args: &[Value],
    index: usize,
) -> Result<Value, RuntimeError> {
    let value = &args[index];
    if value.is_callable() {
        Ok(value.clone())
    } else {
        Err(RuntimeError::type_error(format!(
            "{method}() expected a function (got {})",
            value.type_name()
        )))
    }
}
