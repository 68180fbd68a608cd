//! Container operations: indexing, slicing, membership, length.
//!
//! Sequence indices may be negative to count from the end. Item access
//! on an out-of-range index is an index error, while slice bounds clamp
//! instead; both rules apply uniformly to lists, strings, and byte
//! buffers. String operations are character-based, never byte-based.

use crate::errors::RuntimeError;
use crate::value::Value;

/// Slice bounds. `None` means "from the start" / "to the end"; bounds
/// must be int values and are clamped into range.
#[derive(Debug, Clone, Default)]
pub struct Slice {
    /// Inclusive start bound.
    pub start: Option<Value>,
    /// Exclusive stop bound.
    pub stop: Option<Value>,
}

impl Value {
    /// Number of elements, entries, characters, or bytes.
    pub fn len(&self) -> Result<usize, RuntimeError> {
        match self {
            Value::String(s) => Ok(s.chars().count()),
            Value::Bytes(b) => Ok(b.borrow().len()),
            Value::List(items) => Ok(items.borrow().len()),
            Value::Map(map) => Ok(map.borrow().len()),
            Value::Set(set) => Ok(set.borrow().len()),
            _ => Err(RuntimeError::type_error(format!(
                "{} has no length",
                self.type_name()
            ))),
        }
    }

    /// `container[key]`.
    pub fn get_item(&self, key: &Value) -> Result<Value, RuntimeError> {
        match self {
            Value::List(items) => {
                let items = items.borrow();
                let index = normalize_index(self, key, items.len())?;
                Ok(items[index].clone())
            }
            Value::String(s) => {
                let length = s.chars().count();
                let index = normalize_index(self, key, length)?;
                let ch = s.chars().nth(index).ok_or_else(|| {
                    RuntimeError::index_error(format!("index out of range: {index}"))
                })?;
                Ok(Value::string(ch.to_string()))
            }
            Value::Bytes(b) => {
                let data = b.borrow();
                let index = normalize_index(self, key, data.len())?;
                Ok(Value::Byte(data[index]))
            }
            Value::Map(map) => match map.borrow().get(key)? {
                Some(value) => Ok(value),
                None => Err(RuntimeError::key_error(format!(
                    "key not found: {}",
                    key.inspect()
                ))),
            },
            _ => Err(RuntimeError::type_error(format!(
                "{} is not subscriptable",
                self.type_name()
            ))),
        }
    }

    /// `container[key] = value`. A failed assignment never partially
    /// applies.
    pub fn set_item(&self, key: &Value, value: Value) -> Result<(), RuntimeError> {
        match self {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let index = normalize_index(self, key, items.len())?;
                items[index] = value;
                Ok(())
            }
            Value::Bytes(b) => {
                let byte = match value {
                    Value::Byte(byte) => byte,
                    Value::Int(i) if (0..=255).contains(&i) => i as u8,
                    other => {
                        return Err(RuntimeError::value_error(format!(
                            "cannot store {} in bytes",
                            other.inspect()
                        )))
                    }
                };
                let mut data = b.borrow_mut();
                let index = normalize_index(self, key, data.len())?;
                data[index] = byte;
                Ok(())
            }
            Value::Map(map) => {
                map.borrow_mut().insert(key.clone(), value)?;
                Ok(())
            }
            Value::String(_) => Err(RuntimeError::type_error(
                "strings are immutable",
            )),
            _ => Err(RuntimeError::type_error(format!(
                "{} does not support item assignment",
                self.type_name()
            ))),
        }
    }

    /// `del container[key]`.
    pub fn del_item(&self, key: &Value) -> Result<(), RuntimeError> {
        match self {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let index = normalize_index(self, key, items.len())?;
                items.remove(index);
                Ok(())
            }
            Value::Map(map) => match map.borrow_mut().remove(key)? {
                Some(_) => Ok(()),
                None => Err(RuntimeError::key_error(format!(
                    "key not found: {}",
                    key.inspect()
                ))),
            },
            _ => Err(RuntimeError::type_error(format!(
                "{} does not support item deletion",
                self.type_name()
            ))),
        }
    }

    /// `container[start:stop]`, always a fresh copy of the selected
    /// range. Bounds clamp; a start past the stop yields an empty
    /// result.
    pub fn get_slice(&self, slice: Slice) -> Result<Value, RuntimeError> {
        match self {
            Value::List(items) => {
                let items = items.borrow();
                let (start, stop) = slice_bounds(&slice, items.len())?;
                Ok(Value::list(items[start..stop].to_vec()))
            }
            Value::String(s) => {
                let chars: Vec<char> = s.chars().collect();
                let (start, stop) = slice_bounds(&slice, chars.len())?;
                Ok(Value::string(chars[start..stop].iter().collect::<String>()))
            }
            Value::Bytes(b) => {
                let data = b.borrow();
                let (start, stop) = slice_bounds(&slice, data.len())?;
                Ok(Value::bytes(data[start..stop].to_vec()))
            }
            _ => Err(RuntimeError::type_error(format!(
                "{} is not sliceable",
                self.type_name()
            ))),
        }
    }

    /// Membership: element in list, substring in string, byte or
    /// subsequence in bytes, key in map, member in set.
    pub fn contains(&self, item: &Value) -> Result<bool, RuntimeError> {
        match self {
            Value::List(items) => Ok(items.borrow().iter().any(|v| v.equals(item))),
            Value::String(s) => match item {
                Value::String(needle) => Ok(s.contains(needle.as_ref())),
                other => Err(RuntimeError::type_error(format!(
                    "cannot check string for {}",
                    other.type_name()
                ))),
            },
            Value::Bytes(b) => match item {
                Value::Byte(byte) => Ok(b.borrow().contains(byte)),
                Value::Int(i) if (0..=255).contains(i) => Ok(b.borrow().contains(&(*i as u8))),
                Value::Bytes(needle) => {
                    let data = b.borrow();
                    let needle = needle.borrow();
                    if needle.is_empty() {
                        return Ok(true);
                    }
                    Ok(data.windows(needle.len()).any(|window| window == *needle))
                }
                other => Err(RuntimeError::type_error(format!(
                    "cannot check bytes for {}",
                    other.type_name()
                ))),
            },
            Value::Map(map) => map.borrow().contains(item),
            Value::Set(set) => set.borrow().contains(item),
            _ => Err(RuntimeError::type_error(format!(
                "{} is not a container",
                self.type_name()
            ))),
        }
    }
}

fn normalize_index(container: &Value, key: &Value, length: usize) -> Result<usize, RuntimeError> {
    let index = match key {
        Value::Int(i) => *i,
        other => {
            return Err(RuntimeError::type_error(format!(
                "{} index must be an int, got {}",
                container.type_name(),
                other.type_name()
            )))
        }
    };
    let adjusted = if index < 0 { index + length as i64 } else { index };
    if adjusted < 0 || adjusted as usize >= length {
        return Err(RuntimeError::index_error(format!("index out of range: {index}")));
    }
    Ok(adjusted as usize)
}

fn slice_bounds(slice: &Slice, length: usize) -> Result<(usize, usize), RuntimeError> {
    let start = clamp_bound(slice.start.as_ref(), 0, length)?;
    let stop = clamp_bound(slice.stop.as_ref(), length as i64, length)?;
    Ok((start, stop.max(start)))
}

fn clamp_bound(bound: Option<&Value>, default: i64, length: usize) -> Result<usize, RuntimeError> {
    let raw = match bound {
        None => default,
        Some(Value::Int(i)) => *i,
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "slice bound must be an int, got {}",
                other.type_name()
            )))
        }
    };
    let adjusted = if raw < 0 { raw + length as i64 } else { raw };
    Ok(adjusted.clamp(0, length as i64) as usize)
}
