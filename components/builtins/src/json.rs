//! The `json` module value.

use object_system::{Builtin, ExecEnv, MapValue, Module, RuntimeError, Value};

/// Build the module bound to the `json` builtin slot.
pub fn module() -> Value {
    let entries: Vec<(String, Value)> = vec![
        ("marshal".to_string(), Value::builtin(Builtin::new("json.marshal", marshal))),
        ("unmarshal".to_string(), Value::builtin(Builtin::new("json.unmarshal", unmarshal))),
        ("valid".to_string(), Value::builtin(Builtin::new("json.valid", valid))),
    ];
    Value::module(Module::new("json", entries))
}

/// `json.marshal(x)` / `json.marshal(x, indent)`: serialize through the
/// native export form. A truthy second argument pretty-prints.
fn marshal(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.is_empty() || args.len() > 2 {
        return Value::error(RuntimeError::arity("json.marshal", "1 or 2 arguments", args.len()));
    }
    let native = args[0].to_native();
    let rendered = if args.get(1).is_some_and(Value::is_truthy) {
        serde_json::to_string_pretty(&native)
    } else {
        serde_json::to_string(&native)
    };
    match rendered {
        Ok(text) => Value::string(text),
        Err(err) => Value::error(RuntimeError::value_error(format!("marshal failed: {err}"))),
    }
}

/// `json.unmarshal(text)`: parse JSON into script values. Objects become
/// maps, arrays become lists, numbers become ints when integral.
fn unmarshal(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity("json.unmarshal", "exactly 1 argument", args.len()));
    }
    let text = match args[0].as_str() {
        Some(text) => text,
        None => {
            return Value::error(RuntimeError::type_error(format!(
                "json.unmarshal() requires a string, got {}",
                args[0].type_name()
            )))
        }
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(parsed) => match from_native(&parsed) {
            Ok(value) => value,
            Err(err) => Value::error(err),
        },
        Err(err) => Value::error(RuntimeError::value_error(format!("invalid json: {err}"))),
    }
}

/// `json.valid(text)`: whether the text parses as JSON.
fn valid(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity("json.valid", "exactly 1 argument", args.len()));
    }
    match args[0].as_str() {
        Some(text) => Value::Bool(serde_json::from_str::<serde_json::Value>(text).is_ok()),
        None => Value::FALSE,
    }
}

fn from_native(json: &serde_json::Value) -> Result<Value, RuntimeError> {
    use serde_json::Value as Json;
    Ok(match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::string(s.as_str()),
        Json::Array(items) => {
            let converted =
                items.iter().map(from_native).collect::<Result<Vec<Value>, RuntimeError>>()?;
            Value::list(converted)
        }
        Json::Object(entries) => {
            let mut map = MapValue::new();
            for (key, value) in entries {
                map.insert(Value::string(key.as_str()), from_native(value)?)?;
            }
            Value::map(map)
        }
    })
}
