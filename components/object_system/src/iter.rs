//! Iterators over the iterable types.
//!
//! Iterators advance with a two-phase protocol: `iter_next` moves the
//! cursor and returns the primary value, `iter_entry` exposes the full
//! key/value entry for the current position. Exhaustion is sticky: once
//! `iter_next` has returned `None` the iterator stays finished, even if
//! its container grows afterwards.
//!
//! List and string iterators are index cursors; map and set iterators
//! snapshot their key order at creation and look entries up live, so
//! members deleted mid-iteration are skipped. Mutating a container while
//! iterating is memory-safe but the traversal outcome is unspecified.

use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::RuntimeError;
use crate::hash::HashKey;
use crate::map::{MapValue, SetValue};
use crate::value::Value;

/// One step of iteration: a key, a value, and the primary value that a
/// single-variable loop binds.
#[derive(Debug, Clone)]
pub struct IterEntry {
    key: Value,
    value: Value,
    primary: Value,
}

impl IterEntry {
    /// Build an entry.
    pub fn new(key: Value, value: Value, primary: Value) -> Self {
        Self { key, value, primary }
    }

    /// The key: an index for sequences, the key for maps, the member
    /// itself for sets.
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// The value at the key.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// What a one-variable `for` loop binds.
    pub fn primary(&self) -> &Value {
        &self.primary
    }
}

/// Cursor over a list.
#[derive(Debug)]
pub struct ListIter {
    items: Rc<RefCell<Vec<Value>>>,
    pos: usize,
    done: bool,
    current: Option<Rc<IterEntry>>,
}

impl ListIter {
    pub(crate) fn new(items: Rc<RefCell<Vec<Value>>>) -> Self {
        Self { items, pos: 0, done: false, current: None }
    }

    fn advance(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        let element = {
            let items = self.items.borrow();
            items.get(self.pos).cloned()
        };
        match element {
            Some(element) => {
                let entry =
                    IterEntry::new(Value::Int(self.pos as i64), element.clone(), element.clone());
                self.current = Some(Rc::new(entry));
                self.pos += 1;
                Some(element)
            }
            None => {
                self.done = true;
                self.current = None;
                None
            }
        }
    }
}

/// Cursor over a map's snapshotted key order.
#[derive(Debug)]
pub struct MapIter {
    map: Rc<RefCell<MapValue>>,
    keys: Vec<HashKey>,
    pos: usize,
    done: bool,
    current: Option<Rc<IterEntry>>,
}

impl MapIter {
    pub(crate) fn new(map: Rc<RefCell<MapValue>>) -> Self {
        let keys = map.borrow().snapshot_keys();
        Self { map, keys, pos: 0, done: false, current: None }
    }

    fn advance(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        while self.pos < self.keys.len() {
            let hash = &self.keys[self.pos];
            self.pos += 1;
            let map = self.map.borrow();
            if let (Some(key), Some(value)) = (map.key_by_hash(hash), map.get_by_hash(hash)) {
                let (key, value) = (key.clone(), value.clone());
                drop(map);
                self.current =
                    Some(Rc::new(IterEntry::new(key.clone(), value, key.clone())));
                return Some(key);
            }
        }
        self.done = true;
        self.current = None;
        None
    }
}

/// Cursor over a set's snapshotted member order.
#[derive(Debug)]
pub struct SetIter {
    set: Rc<RefCell<SetValue>>,
    keys: Vec<HashKey>,
    pos: usize,
    done: bool,
    current: Option<Rc<IterEntry>>,
}

impl SetIter {
    pub(crate) fn new(set: Rc<RefCell<SetValue>>) -> Self {
        let keys = set.borrow().snapshot_keys();
        Self { set, keys, pos: 0, done: false, current: None }
    }

    fn advance(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        while self.pos < self.keys.len() {
            let hash = &self.keys[self.pos];
            self.pos += 1;
            let member = self.set.borrow().item_by_hash(hash).cloned();
            if let Some(member) = member {
                self.current = Some(Rc::new(IterEntry::new(
                    member.clone(),
                    member.clone(),
                    member.clone(),
                )));
                return Some(member);
            }
        }
        self.done = true;
        self.current = None;
        None
    }
}

/// Cursor over a string's characters.
#[derive(Debug)]
pub struct StringIter {
    chars: Vec<char>,
    pos: usize,
    done: bool,
    current: Option<Rc<IterEntry>>,
}

impl StringIter {
    pub(crate) fn new(s: &str) -> Self {
        Self { chars: s.chars().collect(), pos: 0, done: false, current: None }
    }

    fn advance(&mut self) -> Option<Value> {
        if self.done {
            return None;
        }
        match self.chars.get(self.pos) {
            Some(ch) => {
                let value = Value::string(ch.to_string());
                let entry =
                    IterEntry::new(Value::Int(self.pos as i64), value.clone(), value.clone());
                self.current = Some(Rc::new(entry));
                self.pos += 1;
                Some(value)
            }
            None => {
                self.done = true;
                self.current = None;
                None
            }
        }
    }
}

impl Value {
    /// A fresh, independently positioned iterator over this value.
    /// Iterators are returned as-is.
    pub fn iter(&self) -> Result<Value, RuntimeError> {
        match self {
            Value::List(items) => {
                Ok(Value::ListIter(Rc::new(RefCell::new(ListIter::new(items.clone())))))
            }
            Value::Map(map) => {
                Ok(Value::MapIter(Rc::new(RefCell::new(MapIter::new(map.clone())))))
            }
            Value::Set(set) => {
                Ok(Value::SetIter(Rc::new(RefCell::new(SetIter::new(set.clone())))))
            }
            Value::String(s) => {
                Ok(Value::StringIter(Rc::new(RefCell::new(StringIter::new(s)))))
            }
            Value::ListIter(_)
            | Value::MapIter(_)
            | Value::SetIter(_)
            | Value::StringIter(_) => Ok(self.clone()),
            _ => Err(RuntimeError::type_error(format!(
                "{} is not iterable",
                self.type_name()
            ))),
        }
    }

    /// Advance an iterator, returning its next primary value.
    pub fn iter_next(&self) -> Result<Option<Value>, RuntimeError> {
        match self {
            Value::ListIter(it) => Ok(it.borrow_mut().advance()),
            Value::MapIter(it) => Ok(it.borrow_mut().advance()),
            Value::SetIter(it) => Ok(it.borrow_mut().advance()),
            Value::StringIter(it) => Ok(it.borrow_mut().advance()),
            _ => Err(RuntimeError::type_error(format!(
                "{} is not an iterator",
                self.type_name()
            ))),
        }
    }

    /// The entry at the current position. `None` before the first
    /// `iter_next` and after exhaustion.
    pub fn iter_entry(&self) -> Result<Option<Value>, RuntimeError> {
        let current = match self {
            Value::ListIter(it) => it.borrow().current.clone(),
            Value::MapIter(it) => it.borrow().current.clone(),
            Value::SetIter(it) => it.borrow().current.clone(),
            Value::StringIter(it) => it.borrow().current.clone(),
            _ => {
                return Err(RuntimeError::type_error(format!(
                    "{} is not an iterator",
                    self.type_name()
                )))
            }
        };
        Ok(current.map(Value::Entry))
    }
}
