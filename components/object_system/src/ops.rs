//! Receiver-directed binary operator dispatch.
//!
//! `run_operation` never panics and never raises directly: an
//! unsupported combination produces an error value, which the VM then
//! raises. Int and float operands promote to float when mixed; bytes
//! promote to int except for byte-on-byte bitwise ops; division keeps
//! integer semantics for ints and IEEE semantics for floats.

use bytecode_system::BinaryOp;

use crate::errors::RuntimeError;
use crate::value::Value;

impl Value {
    /// Evaluate `self <op> right`.
    pub fn run_operation(&self, op: BinaryOp, right: &Value) -> Value {
        match op {
            BinaryOp::Eq => Value::Bool(self.equals(right)),
            BinaryOp::Ne => Value::Bool(!self.equals(right)),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                match self.compare(right) {
                    Ok(ordering) => {
                        let result = match op {
                            BinaryOp::Lt => ordering.is_lt(),
                            BinaryOp::Le => ordering.is_le(),
                            BinaryOp::Gt => ordering.is_gt(),
                            _ => ordering.is_ge(),
                        };
                        Value::Bool(result)
                    }
                    Err(err) => Value::error(err),
                }
            }
            BinaryOp::And => Value::Bool(self.is_truthy() && right.is_truthy()),
            BinaryOp::Or => Value::Bool(self.is_truthy() || right.is_truthy()),
            BinaryOp::In => match right.contains(self) {
                Ok(found) => Value::Bool(found),
                Err(err) => Value::error(err),
            },
            _ => self.run_arith(op, right),
        }
    }

    fn run_arith(&self, op: BinaryOp, right: &Value) -> Value {
        match (self, right) {
            (Value::Int(a), Value::Int(b)) => int_op(*a, op, *b),
            (Value::Int(a), Value::Float(b)) => float_op(*a as f64, op, *b),
            (Value::Float(a), Value::Int(b)) => float_op(*a, op, *b as f64),
            (Value::Float(a), Value::Float(b)) => float_op(*a, op, *b),

            // Byte-on-byte bitwise ops stay bytes; all other byte
            // arithmetic promotes to int.
            (Value::Byte(a), Value::Byte(b)) => match op {
                BinaryOp::BitAnd => Value::Byte(a & b),
                BinaryOp::BitOr => Value::Byte(a | b),
                BinaryOp::BitXor => Value::Byte(a ^ b),
                _ => int_op(i64::from(*a), op, i64::from(*b)),
            },
            (Value::Byte(a), _) => Value::Int(i64::from(*a)).run_arith(op, right),
            (_, Value::Byte(b)) => self.run_arith(op, &Value::Int(i64::from(*b))),

            (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
                Value::string(format!("{a}{b}"))
            }
            (Value::String(a), Value::Int(n)) if op == BinaryOp::Mul => {
                Value::string(a.repeat(clamp_repeat(*n)))
            }
            (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Value::list(items)
            }
            (Value::List(a), Value::Int(n)) if op == BinaryOp::Mul => {
                let source = a.borrow();
                let count = clamp_repeat(*n);
                let mut items = Vec::with_capacity(source.len() * count);
                for _ in 0..count {
                    items.extend(source.iter().cloned());
                }
                Value::list(items)
            }
            (Value::Bytes(a), Value::Bytes(b)) if op == BinaryOp::Add => {
                let mut data = a.borrow().clone();
                data.extend_from_slice(&b.borrow());
                Value::bytes(data)
            }
            (Value::Bytes(a), Value::Int(n)) if op == BinaryOp::Mul => {
                Value::bytes(a.borrow().repeat(clamp_repeat(*n)))
            }

            (Value::Set(a), Value::Set(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                match op {
                    BinaryOp::BitOr => Value::set(a.union(&b)),
                    BinaryOp::BitAnd => Value::set(a.intersection(&b)),
                    BinaryOp::Sub => Value::set(a.difference(&b)),
                    _ => unsupported(op, self, right),
                }
            }

            (Value::Duration(a), Value::Duration(b)) => match op {
                BinaryOp::Add => a
                    .checked_add(b)
                    .map_or_else(|| overflow("duration"), Value::Duration),
                BinaryOp::Sub => a
                    .checked_sub(b)
                    .map_or_else(|| overflow("duration"), Value::Duration),
                _ => unsupported(op, self, right),
            },
            (Value::Duration(d), Value::Int(n)) => match op {
                BinaryOp::Mul => scaled_duration(d.checked_mul(clamp_i32(*n))),
                BinaryOp::Div if *n == 0 => {
                    Value::error(RuntimeError::value_error("division by zero"))
                }
                BinaryOp::Div => scaled_duration(d.checked_div(clamp_i32(*n))),
                _ => unsupported(op, self, right),
            },
            (Value::Time(t), Value::Duration(d)) => match op {
                BinaryOp::Add => t
                    .checked_add_signed(*d)
                    .map_or_else(|| overflow("time"), Value::Time),
                BinaryOp::Sub => t
                    .checked_sub_signed(*d)
                    .map_or_else(|| overflow("time"), Value::Time),
                _ => unsupported(op, self, right),
            },
            (Value::Time(a), Value::Time(b)) if op == BinaryOp::Sub => {
                Value::Duration(a.signed_duration_since(*b))
            }

            _ => unsupported(op, self, right),
        }
    }

    /// Unary arithmetic negation.
    pub fn negate(&self) -> Value {
        match self {
            Value::Int(i) => Value::Int(i.wrapping_neg()),
            Value::Float(x) => Value::Float(-x),
            Value::Byte(b) => Value::Int(-i64::from(*b)),
            Value::Duration(d) => Value::Duration(-*d),
            _ => Value::error(RuntimeError::type_error(format!(
                "bad operand type for unary -: {}",
                self.type_name()
            ))),
        }
    }

    /// Unary logical negation.
    pub fn not(&self) -> Value {
        Value::Bool(!self.is_truthy())
    }
}

fn int_op(a: i64, op: BinaryOp, b: i64) -> Value {
    match op {
        BinaryOp::Add => Value::Int(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
        BinaryOp::Div if b == 0 => Value::error(RuntimeError::value_error("division by zero")),
        BinaryOp::Div => Value::Int(a.wrapping_div(b)),
        BinaryOp::Mod if b == 0 => Value::error(RuntimeError::value_error("division by zero")),
        BinaryOp::Mod => Value::Int(a.wrapping_rem(b)),
        BinaryOp::Pow => int_pow(a, b),
        BinaryOp::BitAnd => Value::Int(a & b),
        BinaryOp::BitOr => Value::Int(a | b),
        BinaryOp::BitXor => Value::Int(a ^ b),
        BinaryOp::Shl | BinaryOp::Shr => shift(a, op, b),
        _ => unsupported(op, &Value::Int(a), &Value::Int(b)),
    }
}

fn float_op(a: f64, op: BinaryOp, b: f64) -> Value {
    match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => Value::Float(a / b),
        BinaryOp::Mod => Value::Float(a % b),
        BinaryOp::Pow => Value::Float(a.powf(b)),
        _ => unsupported(op, &Value::Float(a), &Value::Float(b)),
    }
}

fn int_pow(base: i64, exp: i64) -> Value {
    if exp < 0 {
        return Value::Float((base as f64).powf(exp as f64));
    }
    let exp = u32::try_from(exp).unwrap_or(u32::MAX);
    Value::Int(base.wrapping_pow(exp))
}

fn shift(a: i64, op: BinaryOp, b: i64) -> Value {
    if b < 0 {
        return Value::error(RuntimeError::value_error("negative shift count"));
    }
    if b >= 64 {
        // Shifted out entirely; >> is arithmetic, so sign is preserved.
        return match op {
            BinaryOp::Shl => Value::Int(0),
            _ => Value::Int(if a < 0 { -1 } else { 0 }),
        };
    }
    match op {
        BinaryOp::Shl => Value::Int(a << b),
        _ => Value::Int(a >> b),
    }
}

fn clamp_repeat(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

fn clamp_i32(n: i64) -> i32 {
    i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
}

fn scaled_duration(result: Option<chrono::Duration>) -> Value {
    result.map_or_else(|| overflow("duration"), Value::Duration)
}

fn overflow(what: &str) -> Value {
    Value::error(RuntimeError::value_error(format!("{what} overflow")))
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> Value {
    Value::error(RuntimeError::type_error(format!(
        "unsupported operand types for {}: {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    )))
}
