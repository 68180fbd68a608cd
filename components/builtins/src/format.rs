//! Verb-directed formatting for `print`, `printf`, and `sprintf`.

use object_system::{RuntimeError, Value};

/// The form `print` writes: strings render raw, everything else renders
/// as its inspect form.
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => other.inspect(),
    }
}

/// Render `format` against `args` using a Go-flavored verb set:
/// `%v` display form, `%s` string form, `%d` integer, `%f` float with
/// six decimals, `%t` boolean, `%q` quoted, `%x` lowercase hex, `%%`
/// literal percent. Arguments are consumed left to right; leftover or
/// missing arguments are value errors.
pub fn sprintf(format: &str, args: &[Value]) -> Result<String, RuntimeError> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    let mut next = 0;
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let verb = chars
            .next()
            .ok_or_else(|| RuntimeError::value_error("format string ends with a bare %"))?;
        if verb == '%' {
            out.push('%');
            continue;
        }
        let arg = args.get(next).ok_or_else(|| {
            RuntimeError::value_error(format!(
                "format verb %{verb} has no argument ({} given)",
                args.len()
            ))
        })?;
        next += 1;
        match verb {
            'v' | 's' => out.push_str(&display(arg)),
            'd' => match arg {
                Value::Int(i) => out.push_str(&i.to_string()),
                Value::Byte(b) => out.push_str(&b.to_string()),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "format verb %d requires an integer, got {}",
                        other.type_name()
                    )))
                }
            },
            'f' => match arg {
                Value::Float(x) => out.push_str(&format!("{x:.6}")),
                Value::Int(i) => out.push_str(&format!("{:.6}", *i as f64)),
                Value::Byte(b) => out.push_str(&format!("{:.6}", *b as f64)),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "format verb %f requires a number, got {}",
                        other.type_name()
                    )))
                }
            },
            't' => match arg {
                Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "format verb %t requires a bool, got {}",
                        other.type_name()
                    )))
                }
            },
            'q' => match arg {
                Value::String(s) => out.push_str(&format!("{s:?}")),
                other => out.push_str(&format!("{:?}", display(other))),
            },
            'x' => match arg {
                Value::Int(i) => out.push_str(&format!("{i:x}")),
                Value::Byte(b) => out.push_str(&format!("{b:x}")),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "format verb %x requires an integer, got {}",
                        other.type_name()
                    )))
                }
            },
            other => {
                return Err(RuntimeError::value_error(format!("unknown format verb %{other}")))
            }
        }
    }
    if next < args.len() {
        return Err(RuntimeError::value_error(format!(
            "{} argument(s) unused by format string",
            args.len() - next
        )));
    }
    Ok(out)
}
