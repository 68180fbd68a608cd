//! The global builtin functions.
//!
//! Every function here follows the builtin calling convention: it
//! receives the execution environment and an argument slice, and
//! reports failure by returning an error value, which the machine
//! raises at the call site. Host-level failures from nested calls go
//! through [`ExecEnv::fail`] instead so they stay uncatchable.

use std::cmp::Ordering;
use std::io::Write;
use std::rc::Rc;

use object_system::{resolve_attr, ExecEnv, Partial, RuntimeError, Value};

use crate::format;

fn arity_error(name: &str, want: &str, got: usize) -> Value {
    Value::error(RuntimeError::arity(name, want, got))
}

/// Elements of an iterable in iteration order. Lists are snapshotted
/// without going through an iterator; maps contribute their keys.
fn collect(value: &Value) -> Result<Vec<Value>, RuntimeError> {
    if let Value::List(items) = value {
        return Ok(items.borrow().clone());
    }
    let iter = value.iter()?;
    let mut out = Vec::new();
    while let Some(item) = iter.iter_next()? {
        out.push(item);
    }
    Ok(out)
}

// ============================================================================
// Introspection
// ============================================================================

/// `len(x)`: element, entry, character, or byte count.
pub fn len(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("len", "exactly 1 argument", args.len());
    }
    match args[0].len() {
        Ok(n) => Value::Int(n as i64),
        Err(err) => Value::error(err),
    }
}

/// `type(x)`: the type name as a string.
pub fn type_of(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("type", "exactly 1 argument", args.len());
    }
    Value::string(args[0].type_name())
}

/// `getattr(x, name)` / `getattr(x, name, default)`.
pub fn getattr(env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() < 2 || args.len() > 3 {
        return arity_error("getattr", "2 or 3 arguments", args.len());
    }
    let name = match args[1].as_str() {
        Some(name) => name,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "getattr() attribute name must be a string, got {}",
                args[1].type_name()
            )))
        }
    };
    match resolve_attr(&args[0], env.ctx(), name) {
        Ok(value) => value,
        Err(_) if args.len() == 3 => args[2].clone(),
        Err(err) => Value::error(err),
    }
}

// ============================================================================
// Output and formatting
// ============================================================================

/// `print(args...)`: display forms joined by spaces, newline-terminated.
pub fn print(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    let parts: Vec<String> = args.iter().map(format::display).collect();
    println!("{}", parts.join(" "));
    Value::Nil
}

/// `printf(format, args...)`: verb-formatted output, no trailing newline.
pub fn printf(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() {
        return arity_error("printf", "at least 1 argument", 0);
    }
    let spec = match args[0].as_str() {
        Some(spec) => spec,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "printf() format must be a string, got {}",
                args[0].type_name()
            )))
        }
    };
    match format::sprintf(spec, &args[1..]) {
        Ok(text) => {
            print!("{text}");
            let _ = std::io::stdout().flush();
            Value::Nil
        }
        Err(err) => Value::error(err),
    }
}

/// `sprintf(format, args...)`: verb-formatted string.
pub fn sprintf(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() {
        return arity_error("sprintf", "at least 1 argument", 0);
    }
    let spec = match args[0].as_str() {
        Some(spec) => spec,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "sprintf() format must be a string, got {}",
                args[0].type_name()
            )))
        }
    };
    match format::sprintf(spec, &args[1..]) {
        Ok(text) => Value::string(text),
        Err(err) => Value::error(err),
    }
}

// ============================================================================
// Errors and control
// ============================================================================

/// `error(message)` / `error(format, args...)`: raises a plain error.
/// An existing error value is re-raised unchanged.
pub fn error(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() {
        return arity_error("error", "at least 1 argument", 0);
    }
    match &args[0] {
        Value::Error(err) => Value::Error(err.clone()),
        Value::String(spec) if args.len() > 1 => match format::sprintf(spec, &args[1..]) {
            Ok(message) => Value::error(RuntimeError::generic(message)),
            Err(err) => Value::error(err),
        },
        Value::String(message) => Value::error(RuntimeError::generic(message.to_string())),
        other => Value::error(RuntimeError::generic(format::display(other))),
    }
}

/// `try(candidates...)`: the value of the first candidate that does not
/// raise. Callable candidates are invoked; plain values stand for
/// themselves. After a failure, the next callable receives the error
/// value if it can take one argument. All candidates failing yields nil.
/// Cancellation, deadline, and budget aborts are not interceptable.
pub fn try_call(env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() {
        return arity_error("try", "at least 1 argument", 0);
    }
    let mut last_error: Option<RuntimeError> = None;
    for candidate in args {
        if !candidate.is_callable() {
            return candidate.clone();
        }
        let call_args = match (&last_error, candidate) {
            (Some(err), Value::Function(f)) if f.arity() == 1 => vec![Value::error(err.clone())],
            (Some(err), Value::Builtin(_)) => vec![Value::error(err.clone())],
            _ => Vec::new(),
        };
        match env.call(candidate, call_args) {
            Some(Ok(value)) => return value,
            Some(Err(object_system::ExecError::Raised(raised))) => last_error = Some(raised),
            Some(Err(fatal)) => return env.fail(fatal),
            None => return Value::error(RuntimeError::host("try() requires a call dispatcher")),
        }
    }
    Value::Nil
}

/// `assert(cond)` / `assert(cond, message)`.
pub fn assert(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return arity_error("assert", "1 or 2 arguments", args.len());
    }
    if args[0].is_truthy() {
        return Value::Nil;
    }
    let message = match args.get(1) {
        Some(msg) => format::display(msg),
        None => "assertion failed".to_string(),
    };
    Value::error(RuntimeError::generic(message))
}

/// `call(f, args...)`: invoke a callable with the given arguments.
pub fn call(env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() {
        return arity_error("call", "at least 1 argument", 0);
    }
    match env.call(&args[0], args[1..].to_vec()) {
        Some(Ok(value)) => value,
        Some(Err(err)) => env.fail(err),
        None => Value::error(RuntimeError::host("call() requires a call dispatcher")),
    }
}

/// `partial(f, args...)`: bind leading arguments of a callable.
pub fn partial(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() {
        return arity_error("partial", "at least 1 argument", 0);
    }
    if !args[0].is_callable() {
        return Value::error(RuntimeError::type_error(format!(
            "partial() requires a callable, got {}",
            args[0].type_name()
        )));
    }
    Value::Partial(Rc::new(Partial::new(args[0].clone(), args[1..].to_vec())))
}

/// `coalesce(args...)`: the first non-nil argument, or nil.
pub fn coalesce(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    args.iter().find(|v| !v.is_nil()).cloned().unwrap_or(Value::Nil)
}

// ============================================================================
// Constructors and conversions
// ============================================================================

/// `iter(x)`: a fresh iterator over an iterable.
pub fn iter(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("iter", "exactly 1 argument", args.len());
    }
    match args[0].iter() {
        Ok(it) => it,
        Err(err) => Value::error(err),
    }
}

/// `list()` / `list(iterable)`: a new list of the iterable's elements.
pub fn list(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match args {
        [] => Value::list(Vec::new()),
        [source] => match collect(source) {
            Ok(items) => Value::list(items),
            Err(err) => Value::error(err),
        },
        _ => arity_error("list", "at most 1 argument", args.len()),
    }
}

/// `map()` / `map(map)` / `map(list)`: a new map. A list source must
/// hold `[key, value]` pairs.
pub fn map(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match args {
        [] => Value::empty_map(),
        [Value::Map(existing)] => {
            let mut copy = object_system::MapValue::new();
            copy.extend_from(&existing.borrow());
            Value::map(copy)
        }
        [Value::List(items)] => {
            let mut out = object_system::MapValue::new();
            for item in items.borrow().iter() {
                let pair = match item {
                    Value::List(pair) if pair.borrow().len() == 2 => pair.borrow().clone(),
                    other => {
                        return Value::error(RuntimeError::type_error(format!(
                            "map() requires [key, value] pairs, got {}",
                            other.type_name()
                        )))
                    }
                };
                if let Err(err) = out.insert(pair[0].clone(), pair[1].clone()) {
                    return Value::error(err);
                }
            }
            Value::map(out)
        }
        [other] => Value::error(RuntimeError::type_error(format!(
            "map() requires a map or a list of pairs, got {}",
            other.type_name()
        ))),
        _ => arity_error("map", "at most 1 argument", args.len()),
    }
}

/// `set()` / `set(iterable)`: a new set of the iterable's elements.
pub fn set(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match args {
        [] => Value::set(object_system::SetValue::new()),
        [source] => {
            let items = match collect(source) {
                Ok(items) => items,
                Err(err) => return Value::error(err),
            };
            match Value::set_from(items) {
                Ok(set) => set,
                Err(err) => Value::error(err),
            }
        }
        _ => arity_error("set", "at most 1 argument", args.len()),
    }
}

/// `string()` / `string(x)`: the display form; bytes decode as UTF-8
/// with replacement characters.
pub fn string(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match args {
        [] => Value::string(""),
        [Value::String(s)] => Value::String(s.clone()),
        [Value::Bytes(b)] => Value::string(String::from_utf8_lossy(&b.borrow()).into_owned()),
        [other] => Value::string(format::display(other)),
        _ => arity_error("string", "at most 1 argument", args.len()),
    }
}

/// `int(x)`: integer conversion. Floats truncate toward zero; strings
/// parse as decimal or `0x` hex.
pub fn int(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("int", "exactly 1 argument", args.len());
    }
    match &args[0] {
        Value::Int(i) => Value::Int(*i),
        Value::Byte(b) => Value::Int(*b as i64),
        Value::Float(x) if x.is_finite() => Value::Int(x.trunc() as i64),
        Value::Float(x) => {
            Value::error(RuntimeError::value_error(format!("cannot convert {x} to int")))
        }
        Value::String(s) => match parse_int(s) {
            Some(i) => Value::Int(i),
            None => Value::error(RuntimeError::value_error(format!(
                "invalid integer literal: {s:?}"
            ))),
        },
        other => Value::error(RuntimeError::type_error(format!(
            "int() cannot convert {}",
            other.type_name()
        ))),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// `float(x)`: float conversion.
pub fn float(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("float", "exactly 1 argument", args.len());
    }
    match &args[0] {
        Value::Float(x) => Value::Float(*x),
        Value::Int(i) => Value::Float(*i as f64),
        Value::Byte(b) => Value::Float(*b as f64),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(x) => Value::Float(x),
            Err(_) => {
                Value::error(RuntimeError::value_error(format!("invalid float literal: {s:?}")))
            }
        },
        other => Value::error(RuntimeError::type_error(format!(
            "float() cannot convert {}",
            other.type_name()
        ))),
    }
}

/// `byte(x)`: a byte from an integer in `0..=255`.
pub fn byte(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("byte", "exactly 1 argument", args.len());
    }
    match &args[0] {
        Value::Byte(b) => Value::Byte(*b),
        Value::Int(i) if (0..=255).contains(i) => Value::Byte(*i as u8),
        Value::Int(i) => {
            Value::error(RuntimeError::value_error(format!("byte value out of range: {i}")))
        }
        other => Value::error(RuntimeError::type_error(format!(
            "byte() cannot convert {}",
            other.type_name()
        ))),
    }
}

/// `bytes()` / `bytes(x)`: a byte buffer from a string, list of byte
/// values, another buffer, or a zero-filled length.
pub fn bytes(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match args {
        [] => Value::bytes(Vec::new()),
        [Value::Bytes(b)] => Value::bytes(b.borrow().clone()),
        [Value::String(s)] => Value::bytes(s.as_bytes().to_vec()),
        [Value::Int(n)] if *n >= 0 => Value::bytes(vec![0; *n as usize]),
        [Value::Int(n)] => {
            Value::error(RuntimeError::value_error(format!("negative bytes length: {n}")))
        }
        [Value::List(items)] => {
            let items = items.borrow();
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                match item {
                    Value::Byte(b) => out.push(*b),
                    Value::Int(i) if (0..=255).contains(i) => out.push(*i as u8),
                    other => {
                        return Value::error(RuntimeError::value_error(format!(
                            "bytes() element out of range: {}",
                            other.inspect()
                        )))
                    }
                }
            }
            Value::bytes(out)
        }
        [other] => Value::error(RuntimeError::type_error(format!(
            "bytes() cannot convert {}",
            other.type_name()
        ))),
        _ => arity_error("bytes", "at most 1 argument", args.len()),
    }
}

/// `chr(code)`: the single-character string for a code point.
pub fn chr(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("chr", "exactly 1 argument", args.len());
    }
    let code = match args[0].as_int() {
        Some(code) => code,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "chr() requires an int, got {}",
                args[0].type_name()
            )))
        }
    };
    match u32::try_from(code).ok().and_then(char::from_u32) {
        Some(ch) => Value::string(ch.to_string()),
        None => Value::error(RuntimeError::value_error(format!("chr() code out of range: {code}"))),
    }
}

/// `ord(s)`: the code point of a one-character string.
pub fn ord(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("ord", "exactly 1 argument", args.len());
    }
    let text = match args[0].as_str() {
        Some(text) => text,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "ord() requires a string, got {}",
                args[0].type_name()
            )))
        }
    };
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Value::Int(ch as i64),
        _ => Value::error(RuntimeError::value_error(format!(
            "ord() expects a single character, got {} of them",
            text.chars().count()
        ))),
    }
}

/// `regexp(pattern)`: a compiled regular expression.
pub fn regexp(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("regexp", "exactly 1 argument", args.len());
    }
    match args[0].as_str() {
        Some(pattern) => match Value::regexp(pattern) {
            Ok(value) => value,
            Err(err) => Value::error(err),
        },
        None => Value::error(RuntimeError::type_error(format!(
            "regexp() requires a string pattern, got {}",
            args[0].type_name()
        ))),
    }
}

// ============================================================================
// Collections
// ============================================================================

/// `keys(map)`: the keys in sorted order.
pub fn keys(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("keys", "exactly 1 argument", args.len());
    }
    match &args[0] {
        Value::Map(map) => Value::list(map.borrow().sorted_keys()),
        other => Value::error(RuntimeError::type_error(format!(
            "keys() requires a map, got {}",
            other.type_name()
        ))),
    }
}

/// `sorted(iterable)`: a new list in ascending order.
pub fn sorted(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("sorted", "exactly 1 argument", args.len());
    }
    let mut items = match collect(&args[0]) {
        Ok(items) => items,
        Err(err) => return Value::error(err),
    };
    if let Err(err) = sort_values(&mut items) {
        return Value::error(err);
    }
    Value::list(items)
}

// Insertion sort so a failed comparison aborts cleanly instead of
// feeding the standard sort an inconsistent ordering.
fn sort_values(items: &mut [Value]) -> Result<(), RuntimeError> {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && items[j - 1].compare(&items[j])? == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}

/// `reversed(x)`: a reversed list, or a reversed string for strings.
pub fn reversed(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("reversed", "exactly 1 argument", args.len());
    }
    if let Value::String(s) = &args[0] {
        return Value::string(s.chars().rev().collect::<String>());
    }
    match collect(&args[0]) {
        Ok(mut items) => {
            items.reverse();
            Value::list(items)
        }
        Err(err) => Value::error(err),
    }
}

/// `any(iterable)`: whether any element is truthy.
pub fn any(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("any", "exactly 1 argument", args.len());
    }
    let iter = match args[0].iter() {
        Ok(iter) => iter,
        Err(err) => return Value::error(err),
    };
    loop {
        match iter.iter_next() {
            Ok(Some(item)) if item.is_truthy() => return Value::TRUE,
            Ok(Some(_)) => {}
            Ok(None) => return Value::FALSE,
            Err(err) => return Value::error(err),
        }
    }
}

/// `all(iterable)`: whether every element is truthy. True when empty.
pub fn all(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return arity_error("all", "exactly 1 argument", args.len());
    }
    let iter = match args[0].iter() {
        Ok(iter) => iter,
        Err(err) => return Value::error(err),
    };
    loop {
        match iter.iter_next() {
            Ok(Some(item)) if !item.is_truthy() => return Value::FALSE,
            Ok(Some(_)) => {}
            Ok(None) => return Value::TRUE,
            Err(err) => return Value::error(err),
        }
    }
}

/// `delete(container, key)`: remove a map entry or set member. Missing
/// keys are a no-op.
pub fn delete(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 2 {
        return arity_error("delete", "exactly 2 arguments", args.len());
    }
    let outcome = match &args[0] {
        Value::Map(map) => map.borrow_mut().remove(&args[1]).map(|_| ()),
        Value::Set(set) => set.borrow_mut().remove(&args[1]).map(|_| ()),
        other => Err(RuntimeError::type_error(format!(
            "delete() requires a map or set, got {}",
            other.type_name()
        ))),
    };
    match outcome {
        Ok(()) => Value::Nil,
        Err(err) => Value::error(err),
    }
}
