//! List methods.
//!
//! `each`, `map`, and `filter` run script callbacks, which requires a
//! call dispatcher on the environment; outside a VM they fail with a
//! host error. Callback runs iterate over a snapshot of the receiver, so
//! a callback mutating the list cannot skew the traversal.

use std::cell::RefCell;
use std::rc::Rc;

use crate::attrs::{bounded_args, callable_arg, exact_args, method};
use crate::context::ExecEnv;
use crate::errors::RuntimeError;
use crate::value::Value;

type ListRef = Rc<RefCell<Vec<Value>>>;

/// Look up a list method, bound to its receiver.
pub(crate) fn attr(items: &ListRef, name: &str) -> Option<Value> {
    match name {
        "append" => {
            let items = items.clone();
            method("list.append", move |_env, args| {
                exact_args("list.append", 1, args)?;
                items.borrow_mut().push(args[0].clone());
                Ok(Value::Nil)
            })
        }
        "clear" => {
            let items = items.clone();
            method("list.clear", move |_env, args| {
                exact_args("list.clear", 0, args)?;
                items.borrow_mut().clear();
                Ok(Value::Nil)
            })
        }
        "copy" => {
            let items = items.clone();
            method("list.copy", move |_env, args| {
                exact_args("list.copy", 0, args)?;
                Ok(Value::list(items.borrow().clone()))
            })
        }
        "extend" => {
            let items = items.clone();
            method("list.extend", move |_env, args| {
                exact_args("list.extend", 1, args)?;
                let iter = args[0].iter()?;
                // Drain the source before touching the receiver, so
                // extending a list with itself terminates.
                let mut incoming = Vec::new();
                while let Some(item) = iter.iter_next()? {
                    incoming.push(item);
                }
                items.borrow_mut().extend(incoming);
                Ok(Value::Nil)
            })
        }
        "index" => {
            let items = items.clone();
            method("list.index", move |_env, args| {
                exact_args("list.index", 1, args)?;
                let found = items.borrow().iter().position(|item| item.equals(&args[0]));
                Ok(Value::Int(found.map_or(-1, |i| i as i64)))
            })
        }
        "pop" => {
            let items = items.clone();
            method("list.pop", move |_env, args| {
                bounded_args("list.pop", 0, 1, args)?;
                let mut items = items.borrow_mut();
                if items.is_empty() {
                    return Err(RuntimeError::index_error("pop from empty list"));
                }
                let len = items.len() as i64;
                let index = match args.first() {
                    None => len - 1,
                    Some(arg) => arg.as_int().ok_or_else(|| {
                        RuntimeError::type_error(format!(
                            "list.pop() index must be an int (got {})",
                            arg.type_name()
                        ))
                    })?,
                };
                let resolved = if index < 0 { index + len } else { index };
                if resolved < 0 || resolved >= len {
                    return Err(RuntimeError::index_error(format!(
                        "index out of range: {index}"
                    )));
                }
                Ok(items.remove(resolved as usize))
            })
        }
        "reverse" => {
            let items = items.clone();
            method("list.reverse", move |_env, args| {
                exact_args("list.reverse", 0, args)?;
                items.borrow_mut().reverse();
                Ok(Value::Nil)
            })
        }
        "each" => {
            let items = items.clone();
            method("list.each", move |env, args| {
                exact_args("list.each", 1, args)?;
                let func = callable_arg("list.each", args, 0)?;
                let snapshot = items.borrow().clone();
                for item in snapshot {
                    run_callback(env, "list.each", &func, item)?;
                }
                Ok(Value::Nil)
            })
        }
        "map" => {
            let items = items.clone();
            method("list.map", move |env, args| {
                exact_args("list.map", 1, args)?;
                let func = callable_arg("list.map", args, 0)?;
                let snapshot = items.borrow().clone();
                let mut out = Vec::with_capacity(snapshot.len());
                for item in snapshot {
                    out.push(run_callback(env, "list.map", &func, item)?);
                }
                Ok(Value::list(out))
            })
        }
        "filter" => {
            let items = items.clone();
            method("list.filter", move |env, args| {
                exact_args("list.filter", 1, args)?;
                let func = callable_arg("list.filter", args, 0)?;
                let snapshot = items.borrow().clone();
                let mut out = Vec::new();
                for item in snapshot {
                    let keep = run_callback(env, "list.filter", &func, item.clone())?;
                    if keep.is_truthy() {
                        out.push(item);
                    }
                }
                Ok(Value::list(out))
            })
        }
        _ => None,
    }
}

/// Run one callback invocation, routing host-level failures through the
/// environment's failure channel.
fn run_callback(
    env: &mut ExecEnv<'_>,
    name: &str,
    func: &Value,
    item: Value,
) -> Result<Value, RuntimeError> {
    match env.call(func, vec![item]) {
        Some(Ok(value)) => Ok(value),
        Some(Err(failure)) => {
            let placeholder = env.fail(failure);
            match placeholder {
                Value::Error(err) => Err(err.as_ref().clone()),
                _ => Err(RuntimeError::host("callback failed")),
            }
        }
        None => Err(RuntimeError::host(format!(
            "{name}() cannot run callbacks outside a virtual machine"
        ))),
    }
}
