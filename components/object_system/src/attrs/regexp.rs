//! Regexp methods, backed by the `regex` crate.

use std::rc::Rc;

use crate::attrs::{exact_args, method, str_arg};
use crate::value::{RegexpValue, Value};

/// Look up a regexp method, bound to its receiver.
pub(crate) fn attr(r: &Rc<RegexpValue>, name: &str) -> Option<Value> {
    match name {
        "match" => {
            let r = r.clone();
            method("regexp.match", move |_env, args| {
                exact_args("regexp.match", 1, args)?;
                let haystack = str_arg("regexp.match", args, 0)?;
                Ok(Value::Bool(r.regex().is_match(&haystack)))
            })
        }
        "find" => {
            let r = r.clone();
            method("regexp.find", move |_env, args| {
                exact_args("regexp.find", 1, args)?;
                let haystack = str_arg("regexp.find", args, 0)?;
                Ok(match r.regex().find(&haystack) {
                    Some(found) => Value::string(found.as_str()),
                    None => Value::Nil,
                })
            })
        }
        "find_all" => {
            let r = r.clone();
            method("regexp.find_all", move |_env, args| {
                exact_args("regexp.find_all", 1, args)?;
                let haystack = str_arg("regexp.find_all", args, 0)?;
                let found: Vec<Value> =
                    r.regex().find_iter(&haystack).map(|m| Value::string(m.as_str())).collect();
                Ok(Value::list(found))
            })
        }
        "replace_all" => {
            let r = r.clone();
            method("regexp.replace_all", move |_env, args| {
                exact_args("regexp.replace_all", 2, args)?;
                let haystack = str_arg("regexp.replace_all", args, 0)?;
                let replacement = str_arg("regexp.replace_all", args, 1)?;
                let replaced = r.regex().replace_all(&haystack, replacement.as_ref());
                Ok(Value::string(replaced.into_owned()))
            })
        }
        "split" => {
            let r = r.clone();
            method("regexp.split", move |_env, args| {
                exact_args("regexp.split", 1, args)?;
                let haystack = str_arg("regexp.split", args, 0)?;
                let parts: Vec<Value> =
                    r.regex().split(&haystack).map(Value::string).collect();
                Ok(Value::list(parts))
            })
        }
        _ => None,
    }
}
