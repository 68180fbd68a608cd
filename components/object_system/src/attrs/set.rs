//! Set methods.

use std::cell::RefCell;
use std::rc::Rc;

use crate::attrs::{exact_args, method};
use crate::errors::RuntimeError;
use crate::map::SetValue;
use crate::value::Value;

type SetRef = Rc<RefCell<SetValue>>;

fn other_set(method: &str, value: &Value) -> Result<SetRef, RuntimeError> {
    match value {
        Value::Set(other) => Ok(other.clone()),
        other => Err(RuntimeError::type_error(format!(
            "{method}() expected a set (got {})",
            other.type_name()
        ))),
    }
}

/// Look up a set method, bound to its receiver.
pub(crate) fn attr(set: &SetRef, name: &str) -> Option<Value> {
    match name {
        "add" => {
            let set = set.clone();
            method("set.add", move |_env, args| {
                exact_args("set.add", 1, args)?;
                set.borrow_mut().add(args[0].clone())?;
                Ok(Value::Nil)
            })
        }
        "remove" => {
            let set = set.clone();
            method("set.remove", move |_env, args| {
                exact_args("set.remove", 1, args)?;
                if set.borrow_mut().remove(&args[0])? {
                    Ok(Value::Nil)
                } else {
                    Err(RuntimeError::key_error(format!(
                        "key not found: {}",
                        args[0].inspect()
                    )))
                }
            })
        }
        "clear" => {
            let set = set.clone();
            method("set.clear", move |_env, args| {
                exact_args("set.clear", 0, args)?;
                set.borrow_mut().clear();
                Ok(Value::Nil)
            })
        }
        "contains" => {
            let set = set.clone();
            method("set.contains", move |_env, args| {
                exact_args("set.contains", 1, args)?;
                Ok(Value::Bool(set.borrow().contains(&args[0])?))
            })
        }
        "union" => {
            let set = set.clone();
            method("set.union", move |_env, args| {
                exact_args("set.union", 1, args)?;
                let other = other_set("set.union", &args[0])?;
                if Rc::ptr_eq(&set, &other) {
                    return Ok(Value::set(set.borrow().clone()));
                }
                let result = set.borrow().union(&other.borrow());
                Ok(Value::set(result))
            })
        }
        "intersection" => {
            let set = set.clone();
            method("set.intersection", move |_env, args| {
                exact_args("set.intersection", 1, args)?;
                let other = other_set("set.intersection", &args[0])?;
                if Rc::ptr_eq(&set, &other) {
                    return Ok(Value::set(set.borrow().clone()));
                }
                let result = set.borrow().intersection(&other.borrow());
                Ok(Value::set(result))
            })
        }
        "items" => {
            let set = set.clone();
            method("set.items", move |_env, args| {
                exact_args("set.items", 0, args)?;
                Ok(Value::list(set.borrow().sorted_items()))
            })
        }
        _ => None,
    }
}
