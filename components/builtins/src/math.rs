//! The `math` module value.

use std::cmp::Ordering;
use std::f64::consts;

use object_system::{Builtin, ExecEnv, Module, RuntimeError, Value};

/// Build the module bound to the `math` builtin slot.
pub fn module() -> Value {
    let entries: Vec<(String, Value)> = vec![
        ("PI".to_string(), Value::Float(consts::PI)),
        ("E".to_string(), Value::Float(consts::E)),
        ("inf".to_string(), Value::Float(f64::INFINITY)),
        ("nan".to_string(), Value::Float(f64::NAN)),
        entry("abs", abs),
        entry("ceil", ceil),
        entry("floor", floor),
        entry("round", round),
        entry("sqrt", sqrt),
        entry("pow", pow),
        entry("log", log),
        entry("min", min),
        entry("max", max),
        entry("sum", sum),
        entry("is_inf", is_inf),
    ];
    Value::module(Module::new("math", entries))
}

fn entry(name: &str, f: fn(&mut ExecEnv<'_>, &[Value]) -> Value) -> (String, Value) {
    (name.to_string(), Value::builtin(Builtin::new(format!("math.{name}"), f)))
}

fn number(name: &str, value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Int(i) => Ok(*i as f64),
        Value::Byte(b) => Ok(*b as f64),
        other => Err(RuntimeError::type_error(format!(
            "math.{name}() requires a number, got {}",
            other.type_name()
        ))),
    }
}

fn unary(name: &str, args: &[Value], f: impl Fn(f64) -> f64) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity(&format!("math.{name}"), "exactly 1 argument", args.len()));
    }
    match number(name, &args[0]) {
        Ok(x) => Value::Float(f(x)),
        Err(err) => Value::error(err),
    }
}

fn abs(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity("math.abs", "exactly 1 argument", args.len()));
    }
    match &args[0] {
        Value::Int(i) => match i.checked_abs() {
            Some(magnitude) => Value::Int(magnitude),
            None => Value::error(RuntimeError::value_error("integer overflow in math.abs")),
        },
        Value::Byte(b) => Value::Int(*b as i64),
        Value::Float(x) => Value::Float(x.abs()),
        other => Value::error(RuntimeError::type_error(format!(
            "math.abs() requires a number, got {}",
            other.type_name()
        ))),
    }
}

fn ceil(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    unary("ceil", args, f64::ceil)
}

fn floor(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    unary("floor", args, f64::floor)
}

fn round(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    unary("round", args, f64::round)
}

fn sqrt(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    unary("sqrt", args, f64::sqrt)
}

fn log(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    unary("log", args, f64::ln)
}

fn pow(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 2 {
        return Value::error(RuntimeError::arity("math.pow", "exactly 2 arguments", args.len()));
    }
    match (number("pow", &args[0]), number("pow", &args[1])) {
        (Ok(base), Ok(exponent)) => Value::Float(base.powf(exponent)),
        (Err(err), _) | (_, Err(err)) => Value::error(err),
    }
}

/// Candidates for `min`/`max`: the arguments themselves, or the
/// elements of a single list argument.
fn candidates(name: &str, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
    let items = match args {
        [Value::List(items)] => items.borrow().clone(),
        _ => args.to_vec(),
    };
    if items.is_empty() {
        return Err(RuntimeError::arity(&format!("math.{name}"), "at least 1 value", 0));
    }
    Ok(items)
}

fn extreme(name: &str, args: &[Value], keep: Ordering) -> Value {
    let items = match candidates(name, args) {
        Ok(items) => items,
        Err(err) => return Value::error(err),
    };
    let mut best = items[0].clone();
    for item in &items[1..] {
        match item.compare(&best) {
            Ok(order) if order == keep => best = item.clone(),
            Ok(_) => {}
            Err(err) => return Value::error(err),
        }
    }
    best
}

fn min(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    extreme("min", args, Ordering::Less)
}

fn max(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    extreme("max", args, Ordering::Greater)
}

/// `math.sum(list)`: integers stay integral until a float appears.
fn sum(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    let items = match candidates("sum", args) {
        Ok(items) => items,
        Err(err) => return Value::error(err),
    };
    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut saw_float = false;
    for item in &items {
        match item {
            Value::Int(i) => int_total = int_total.wrapping_add(*i),
            Value::Byte(b) => int_total = int_total.wrapping_add(*b as i64),
            Value::Float(x) => {
                saw_float = true;
                float_total += x;
            }
            other => {
                return Value::error(RuntimeError::type_error(format!(
                    "math.sum() requires numbers, got {}",
                    other.type_name()
                )))
            }
        }
    }
    if saw_float {
        Value::Float(float_total + int_total as f64)
    } else {
        Value::Int(int_total)
    }
}

fn is_inf(_env: &mut ExecEnv<'_>, args: &[Value]) -> Value {
    if args.len() != 1 {
        return Value::error(RuntimeError::arity("math.is_inf", "exactly 1 argument", args.len()));
    }
    match &args[0] {
        Value::Float(x) => Value::Bool(x.is_infinite()),
        Value::Int(_) | Value::Byte(_) => Value::FALSE,
        other => Value::error(RuntimeError::type_error(format!(
            "math.is_inf() requires a number, got {}",
            other.type_name()
        ))),
    }
}
