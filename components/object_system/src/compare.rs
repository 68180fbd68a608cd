//! Ordered comparison.
//!
//! Unlike [`Value::equals`], ordered comparison promotes across the
//! numeric types, so `1 < 1.5` and `byte(2) > 1` work. Every other
//! cross-type pairing is a type error; [`compare_types`] is the explicit
//! fallback total order (by type name) for embedders that need to sort
//! heterogeneous data anyway.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::value::Value;

impl Value {
    /// Ordered comparison with numeric promotion. Errors on NaN
    /// comparisons and on non-numeric cross-type pairs.
    pub fn compare(&self, other: &Value) -> Result<Ordering, RuntimeError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => cmp_f64(*a as f64, *b),
            (Value::Float(a), Value::Int(b)) => cmp_f64(*a, *b as f64),
            (Value::Float(a), Value::Float(b)) => cmp_f64(*a, *b),
            (Value::Byte(a), Value::Byte(b)) => Ok(a.cmp(b)),
            (Value::Byte(a), Value::Int(b)) => Ok(i64::from(*a).cmp(b)),
            (Value::Int(a), Value::Byte(b)) => Ok(a.cmp(&i64::from(*b))),
            (Value::Byte(a), Value::Float(b)) => cmp_f64(f64::from(*a), *b),
            (Value::Float(a), Value::Byte(b)) => cmp_f64(*a, f64::from(*b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(a.borrow().cmp(&b.borrow())),
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(Ordering::Equal);
                }
                let (a, b) = (a.borrow(), b.borrow());
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        unequal => return Ok(unequal),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            (Value::Time(a), Value::Time(b)) => Ok(a.cmp(b)),
            (Value::Duration(a), Value::Duration(b)) => Ok(a.cmp(b)),
            _ => Err(RuntimeError::type_error(format!(
                "unsupported comparison between {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Result<Ordering, RuntimeError> {
    a.partial_cmp(&b)
        .ok_or_else(|| RuntimeError::value_error("cannot compare nan values"))
}

/// Total order over type names: the deterministic tie-breaker for
/// heterogeneous sorting.
pub fn compare_types(a: &Value, b: &Value) -> Ordering {
    a.type_name().cmp(b.type_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.0)).unwrap(), Ordering::Equal);
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)).unwrap(), Ordering::Less);
        assert_eq!(Value::Byte(2).compare(&Value::Int(1)).unwrap(), Ordering::Greater);
        assert_eq!(Value::Float(0.5).compare(&Value::Byte(1)).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_nan_comparison_errors() {
        let err = Value::Float(f64::NAN).compare(&Value::Float(1.0)).unwrap_err();
        assert_eq!(err.to_string(), "value error: cannot compare nan values");
    }

    #[test]
    fn test_sequences_compare_lexicographically() {
        assert_eq!(
            Value::string("apple").compare(&Value::string("banana")).unwrap(),
            Ordering::Less
        );
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(a.compare(&b).unwrap(), Ordering::Less);
        let shorter = Value::list(vec![Value::Int(1)]);
        assert_eq!(shorter.compare(&a).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_non_numeric_cross_type_errors() {
        let err = Value::string("a").compare(&Value::Int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type error: unsupported comparison between string and int"
        );
        assert!(Value::Nil.compare(&Value::Nil).is_err());
    }

    #[test]
    fn test_compare_types_is_name_order() {
        assert_eq!(compare_types(&Value::Float(1.0), &Value::Int(1)), Ordering::Less);
        assert_eq!(compare_types(&Value::Int(1), &Value::string("a")), Ordering::Less);
        assert_eq!(compare_types(&Value::Nil, &Value::Nil), Ordering::Equal);
    }
}
