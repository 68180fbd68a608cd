//! The `time` module value: clock access and duration constructors.

use chrono::{DateTime, Duration, Utc};
use object_system::{Builtin, ExecEnv, Module, RuntimeError, Value};

/// Build the module bound to the `time` builtin slot.
pub fn module() -> Value {
    let entries: Vec<(String, Value)> = vec![
        entry("now", now),
        entry("unix", unix),
        entry("parse", parse),
        entry("since", since),
        entry("seconds", seconds),
        entry("millis", millis),
        entry("minutes", minutes),
        entry("hours", hours),
    ];
    Value::module(Module::new("time", entries))
}

fn entry(name: &str, f: fn(&mut ExecEnv<'_>, &[Value]) -> Value) -> (String, Value) {
    (name.to_string(), Value::builtin(Builtin::new(format!("time.{name}"), f)))
}

/// `time.now()`: the current instant, UTC.
fn now(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if !args.is_empty() {
        return Value::error(RuntimeError::arity("time.now", "no arguments", args.len()));
    }
    Value::Time(Utc::now())
}

/// `time.unix(secs)`: the instant at a Unix timestamp.
fn unix(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity("time.unix", "exactly 1 argument", args.len()));
    }
    let secs = match args[0].as_int() {
        Some(secs) => secs,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "time.unix() requires an int, got {}",
                args[0].type_name()
            )))
        }
    };
    match DateTime::from_timestamp(secs, 0) {
        Some(t) => Value::Time(t),
        None => Value::error(RuntimeError::value_error(format!("timestamp out of range: {secs}"))),
    }
}

/// `time.parse(text)`: parse an RFC 3339 timestamp.
fn parse(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity("time.parse", "exactly 1 argument", args.len()));
    }
    let text = match args[0].as_str() {
        Some(text) => text,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "time.parse() requires a string, got {}",
                args[0].type_name()
            )))
        }
    };
    match DateTime::parse_from_rfc3339(text) {
        Ok(t) => Value::Time(t.with_timezone(&Utc)),
        Err(err) => Value::error(RuntimeError::value_error(format!("invalid timestamp: {err}"))),
    }
}

/// `time.since(t)`: the duration elapsed since an instant.
fn since(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity("time.since", "exactly 1 argument", args.len()));
    }
    match &args[0] {
        Value::Time(t) => Value::Duration(Utc::now().signed_duration_since(*t)),
        other => Value::error(RuntimeError::type_error(format!(
            "time.since() requires a time, got {}",
            other.type_name()
        ))),
    }
}

fn duration_arg(name: &str, args: &[Value]) -> Result<i64, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::arity(&format!("time.{name}"), "exactly 1 argument", args.len()));
    }
    args[0].as_int().ok_or_else(|| {
        RuntimeError::type_error(format!(
            "time.{name}() requires an int, got {}",
            args[0].type_name()
        ))
    })
}

/// `time.seconds(n)`: a duration of whole seconds.
fn seconds(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match duration_arg("seconds", args) {
        Ok(n) => match Duration::try_seconds(n) {
            Some(d) => Value::Duration(d),
            None => Value::error(RuntimeError::value_error(format!("duration out of range: {n}s"))),
        },
        Err(err) => Value::error(err),
    }
}

/// `time.millis(n)`: a duration of whole milliseconds.
fn millis(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match duration_arg("millis", args) {
        Ok(n) => Value::Duration(Duration::milliseconds(n)),
        Err(err) => Value::error(err),
    }
}

/// `time.minutes(n)`: a duration of whole minutes.
fn minutes(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match duration_arg("minutes", args) {
        Ok(n) => match Duration::try_minutes(n) {
            Some(d) => Value::Duration(d),
            None => Value::error(RuntimeError::value_error(format!("duration out of range: {n}m"))),
        },
        Err(err) => Value::error(err),
    }
}

/// `time.hours(n)`: a duration of whole hours.
fn hours(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    match duration_arg("hours", args) {
        Ok(n) => match Duration::try_hours(n) {
            Some(d) => Value::Duration(d),
            None => Value::error(RuntimeError::value_error(format!("duration out of range: {n}h"))),
        },
        Err(err) => Value::error(err),
    }
}
