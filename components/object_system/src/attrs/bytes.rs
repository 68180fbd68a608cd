//! Bytes methods.

use std::cell::RefCell;
use std::rc::Rc;

use crate::attrs::{exact_args, method};
use crate::errors::RuntimeError;
use crate::value::Value;

type BytesRef = Rc<RefCell<Vec<u8>>>;

/// Look up a bytes method, bound to its receiver.
pub(crate) fn attr(bytes: &BytesRef, name: &str) -> Option<Value> {
    match name {
        "len" => {
            let bytes = bytes.clone();
            method("bytes.len", move |_env, args| {
                exact_args("bytes.len", 0, args)?;
                Ok(Value::Int(bytes.borrow().len() as i64))
            })
        }
        "decode" => {
            let bytes = bytes.clone();
            method("bytes.decode", move |_env, args| {
                exact_args("bytes.decode", 0, args)?;
                match String::from_utf8(bytes.borrow().clone()) {
                    Ok(s) => Ok(Value::string(s)),
                    Err(_) => Err(RuntimeError::value_error("invalid utf-8 in bytes")),
                }
            })
        }
        "copy" => {
            let bytes = bytes.clone();
            method("bytes.copy", move |_env, args| {
                exact_args("bytes.copy", 0, args)?;
                Ok(Value::bytes(bytes.borrow().clone()))
            })
        }
        _ => None,
    }
}
