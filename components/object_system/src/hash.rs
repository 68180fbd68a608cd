//! Hash keys for map keys and set members.
//!
//! Only bool, int, float, string, and byte values are hashable. The key
//! carries the type tag in its discriminant, so equal payloads of
//! different types (int 1 and byte 1, say) can never collide. Floats are
//! keyed by bit pattern with negative zero normalized, which keeps the
//! invariant that values equal under `equals` derive identical keys.

use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::value::Value;

/// Derived hash key of a hashable value.
///
/// The `Ord` impl gives an arbitrary but stable total order used for
/// deterministic map/set iteration and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKey {
    /// Key of a bool value.
    Bool(bool),
    /// Key of an int value.
    Int(i64),
    /// Key of a float value, by normalized bit pattern.
    Float(u64),
    /// Key of a string value.
    Str(Rc<str>),
    /// Key of a byte value.
    Byte(u8),
}

impl Value {
    /// Derive the hash key, or a type error for unhashable values. The
    /// error surfaces exactly where a value enters a key position.
    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(HashKey::Bool(*b)),
            Value::Int(i) => Ok(HashKey::Int(*i)),
            Value::Float(x) => {
                // Fold -0.0 into +0.0: the two are `equals` and must
                // share a key.
                let x = if *x == 0.0 { 0.0 } else { *x };
                Ok(HashKey::Float(x.to_bits()))
            }
            Value::String(s) => Ok(HashKey::Str(s.clone())),
            Value::Byte(b) => Ok(HashKey::Byte(*b)),
            other => Err(RuntimeError::type_error(format!(
                "unhashable type: {}",
                other.type_name()
            ))),
        }
    }
}
