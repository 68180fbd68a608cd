//! Time and duration methods.

use std::fmt::Write;

use chrono::{DateTime, Duration, Utc};

use crate::attrs::{exact_args, method, str_arg};
use crate::errors::RuntimeError;
use crate::value::{duration_seconds, format_duration, Value};

fn other_time(method: &str, value: &Value) -> Result<DateTime<Utc>, RuntimeError> {
    match value {
        Value::Time(t) => Ok(*t),
        other => Err(RuntimeError::type_error(format!(
            "{method}() expected a time (got {})",
            other.type_name()
        ))),
    }
}

/// Look up a time method, bound to its receiver.
pub(crate) fn time_attr(t: DateTime<Utc>, name: &str) -> Option<Value> {
    match name {
        "unix" => method("time.unix", move |_env, args| {
            exact_args("time.unix", 0, args)?;
            Ok(Value::Int(t.timestamp()))
        }),
        "format" => method("time.format", move |_env, args| {
            exact_args("time.format", 1, args)?;
            let layout = str_arg("time.format", args, 0)?;
            // chrono reports unknown specifiers through fmt::Error, so
            // render into a buffer instead of calling to_string.
            let mut rendered = String::new();
            match write!(rendered, "{}", t.format(&layout)) {
                Ok(()) => Ok(Value::string(rendered)),
                Err(_) => Err(RuntimeError::value_error(format!(
                    "invalid time format: {layout:?}"
                ))),
            }
        }),
        "before" => method("time.before", move |_env, args| {
            exact_args("time.before", 1, args)?;
            Ok(Value::Bool(t < other_time("time.before", &args[0])?))
        }),
        "after" => method("time.after", move |_env, args| {
            exact_args("time.after", 1, args)?;
            Ok(Value::Bool(t > other_time("time.after", &args[0])?))
        }),
        _ => None,
    }
}

/// Look up a duration method, bound to its receiver.
pub(crate) fn duration_attr(d: Duration, name: &str) -> Option<Value> {
    match name {
        "seconds" => method("duration.seconds", move |_env, args| {
            exact_args("duration.seconds", 0, args)?;
            Ok(Value::Float(duration_seconds(d)))
        }),
        "minutes" => method("duration.minutes", move |_env, args| {
            exact_args("duration.minutes", 0, args)?;
            Ok(Value::Float(duration_seconds(d) / 60.0))
        }),
        "hours" => method("duration.hours", move |_env, args| {
            exact_args("duration.hours", 0, args)?;
            Ok(Value::Float(duration_seconds(d) / 3600.0))
        }),
        "string" => method("duration.string", move |_env, args| {
            exact_args("duration.string", 0, args)?;
            Ok(Value::string(format_duration(d)))
        }),
        _ => None,
    }
}
