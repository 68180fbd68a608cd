//! Map methods.

use std::cell::RefCell;
use std::rc::Rc;

use crate::attrs::{bounded_args, exact_args, method};
use crate::errors::RuntimeError;
use crate::map::MapValue;
use crate::value::Value;

type MapRef = Rc<RefCell<MapValue>>;

/// Look up a map method, bound to its receiver.
pub(crate) fn attr(map: &MapRef, name: &str) -> Option<Value> {
    match name {
        "keys" => {
            let map = map.clone();
            method("map.keys", move |_env, args| {
                exact_args("map.keys", 0, args)?;
                Ok(Value::list(map.borrow().sorted_keys()))
            })
        }
        "values" => {
            let map = map.clone();
            method("map.values", move |_env, args| {
                exact_args("map.values", 0, args)?;
                let values = map.borrow().sorted_entries().into_iter().map(|(_, v)| v).collect();
                Ok(Value::list(values))
            })
        }
        "get" => {
            let map = map.clone();
            method("map.get", move |_env, args| {
                bounded_args("map.get", 1, 2, args)?;
                let found = map.borrow().get(&args[0])?;
                Ok(found.unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::Nil)))
            })
        }
        "pop" => {
            let map = map.clone();
            method("map.pop", move |_env, args| {
                bounded_args("map.pop", 1, 2, args)?;
                match map.borrow_mut().remove(&args[0])? {
                    Some(value) => Ok(value),
                    None => match args.get(1) {
                        Some(fallback) => Ok(fallback.clone()),
                        None => Err(RuntimeError::key_error(format!(
                            "key not found: {}",
                            args[0].inspect()
                        ))),
                    },
                }
            })
        }
        "clear" => {
            let map = map.clone();
            method("map.clear", move |_env, args| {
                exact_args("map.clear", 0, args)?;
                map.borrow_mut().clear();
                Ok(Value::Nil)
            })
        }
        "copy" => {
            let map = map.clone();
            method("map.copy", move |_env, args| {
                exact_args("map.copy", 0, args)?;
                Ok(Value::map(map.borrow().clone()))
            })
        }
        "update" => {
            let map = map.clone();
            method("map.update", move |_env, args| {
                exact_args("map.update", 1, args)?;
                match &args[0] {
                    Value::Map(other) => {
                        if Rc::ptr_eq(&map, other) {
                            return Ok(Value::Nil);
                        }
                        map.borrow_mut().extend_from(&other.borrow());
                        Ok(Value::Nil)
                    }
                    other => Err(RuntimeError::type_error(format!(
                        "map.update() expected a map (got {})",
                        other.type_name()
                    ))),
                }
            })
        }
        _ => None,
    }
}
