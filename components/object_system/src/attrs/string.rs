//! String methods.

use std::rc::Rc;

use crate::attrs::{bounded_args, exact_args, method, str_arg};
use crate::value::Value;

/// Look up a string method, bound to its receiver.
pub(crate) fn attr(s: &Rc<str>, name: &str) -> Option<Value> {
    match name {
        "len" => {
            let s = s.clone();
            method("string.len", move |_env, args| {
                exact_args("string.len", 0, args)?;
                Ok(Value::Int(s.chars().count() as i64))
            })
        }
        "contains" => {
            let s = s.clone();
            method("string.contains", move |_env, args| {
                exact_args("string.contains", 1, args)?;
                let needle = str_arg("string.contains", args, 0)?;
                Ok(Value::Bool(s.contains(needle.as_ref())))
            })
        }
        "has_prefix" => {
            let s = s.clone();
            method("string.has_prefix", move |_env, args| {
                exact_args("string.has_prefix", 1, args)?;
                let prefix = str_arg("string.has_prefix", args, 0)?;
                Ok(Value::Bool(s.starts_with(prefix.as_ref())))
            })
        }
        "has_suffix" => {
            let s = s.clone();
            method("string.has_suffix", move |_env, args| {
                exact_args("string.has_suffix", 1, args)?;
                let suffix = str_arg("string.has_suffix", args, 0)?;
                Ok(Value::Bool(s.ends_with(suffix.as_ref())))
            })
        }
        "to_upper" => {
            let s = s.clone();
            method("string.to_upper", move |_env, args| {
                exact_args("string.to_upper", 0, args)?;
                Ok(Value::string(s.to_uppercase()))
            })
        }
        "to_lower" => {
            let s = s.clone();
            method("string.to_lower", move |_env, args| {
                exact_args("string.to_lower", 0, args)?;
                Ok(Value::string(s.to_lowercase()))
            })
        }
        "trim" => {
            let s = s.clone();
            method("string.trim", move |_env, args| {
                bounded_args("string.trim", 0, 1, args)?;
                match args.first() {
                    None => Ok(Value::string(s.trim())),
                    Some(_) => {
                        let cutset = str_arg("string.trim", args, 0)?;
                        let chars: Vec<char> = cutset.chars().collect();
                        Ok(Value::string(s.trim_matches(chars.as_slice())))
                    }
                }
            })
        }
        "split" => {
            let s = s.clone();
            method("string.split", move |_env, args| {
                exact_args("string.split", 1, args)?;
                let sep = str_arg("string.split", args, 0)?;
                // An empty separator splits into characters.
                let parts: Vec<Value> = if sep.is_empty() {
                    s.chars().map(|c| Value::string(c.to_string())).collect()
                } else {
                    s.split(sep.as_ref()).map(Value::string).collect()
                };
                Ok(Value::list(parts))
            })
        }
        "replace_all" => {
            let s = s.clone();
            method("string.replace_all", move |_env, args| {
                exact_args("string.replace_all", 2, args)?;
                let from = str_arg("string.replace_all", args, 0)?;
                let to = str_arg("string.replace_all", args, 1)?;
                Ok(Value::string(s.replace(from.as_ref(), &to)))
            })
        }
        "fields" => {
            let s = s.clone();
            method("string.fields", move |_env, args| {
                exact_args("string.fields", 0, args)?;
                let parts: Vec<Value> = s.split_whitespace().map(Value::string).collect();
                Ok(Value::list(parts))
            })
        }
        _ => None,
    }
}
