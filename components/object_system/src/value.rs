//! The value catalog and its core contract.
//!
//! [`Value`] is a tagged union covering every type a script can touch.
//! Each contract method (`inspect`, `is_truthy`, `equals`, ...) matches
//! exhaustively over the catalog, so adding a variant fails to compile
//! until every dispatch site handles it. Heap variants share their
//! payloads through `Rc`, with interior mutability only for the mutable
//! containers; compiled code referenced by functions stays in `Arc`s so
//! it can be shared across threads even though live values cannot.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use bytecode_system::{Code, FunctionUnit};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::attrs;
use crate::context::Builtin;
use crate::errors::RuntimeError;
use crate::iter::{IterEntry, ListIter, MapIter, SetIter, StringIter};
use crate::map::{MapValue, SetValue};
use crate::proxy::ProxyObject;

/// Type tag of a value. `name()` is the language-visible spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// `bool`
    Bool,
    /// `builtin`
    Builtin,
    /// `byte`
    Byte,
    /// `bytes`
    Bytes,
    /// `cell`
    Cell,
    /// `duration`
    Duration,
    /// `error`
    Error,
    /// `float`
    Float,
    /// `function`
    Function,
    /// `int`
    Int,
    /// `iter_entry`
    IterEntry,
    /// `list`
    List,
    /// `list_iter`
    ListIter,
    /// `map`
    Map,
    /// `map_iter`
    MapIter,
    /// `module`
    Module,
    /// `nil`
    Nil,
    /// `partial`
    Partial,
    /// `proxy`
    Proxy,
    /// `regexp`
    Regexp,
    /// `set`
    Set,
    /// `set_iter`
    SetIter,
    /// `string`
    String,
    /// `string_iter`
    StringIter,
    /// `time`
    Time,
}

impl Type {
    /// The name reported by the `type` builtin.
    pub fn name(self) -> &'static str {
        match self {
            Type::Bool => "bool",
            Type::Builtin => "builtin",
            Type::Byte => "byte",
            Type::Bytes => "bytes",
            Type::Cell => "cell",
            Type::Duration => "duration",
            Type::Error => "error",
            Type::Float => "float",
            Type::Function => "function",
            Type::Int => "int",
            Type::IterEntry => "iter_entry",
            Type::List => "list",
            Type::ListIter => "list_iter",
            Type::Map => "map",
            Type::MapIter => "map_iter",
            Type::Module => "module",
            Type::Nil => "nil",
            Type::Partial => "partial",
            Type::Proxy => "proxy",
            Type::Regexp => "regexp",
            Type::Set => "set",
            Type::SetIter => "set_iter",
            Type::String => "string",
            Type::StringIter => "string_iter",
            Type::Time => "time",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compiled closure: a function unit plus its captured cells and the
/// code snapshot owning its constant pool.
#[derive(Debug, Clone)]
pub struct Function {
    unit: Arc<FunctionUnit>,
    code: Arc<Code>,
    free: Vec<Value>,
}

impl Function {
    /// Build a closure. `free` must hold exactly `unit.frees` cell
    /// values, in capture order.
    pub fn new(unit: Arc<FunctionUnit>, code: Arc<Code>, free: Vec<Value>) -> Self {
        Self { unit, code, free }
    }

    /// The compiled body.
    pub fn unit(&self) -> &Arc<FunctionUnit> {
        &self.unit
    }

    /// The code snapshot whose constant pool the body indexes into.
    pub fn code(&self) -> &Arc<Code> {
        &self.code
    }

    /// Captured cell by index.
    pub fn free(&self, index: usize) -> Option<&Value> {
        self.free.get(index)
    }

    /// Declared name; empty for anonymous functions.
    pub fn name(&self) -> &str {
        &self.unit.name
    }

    /// Required argument count.
    pub fn arity(&self) -> usize {
        self.unit.arity()
    }
}

/// A callable with some arguments already bound.
#[derive(Debug, Clone)]
pub struct Partial {
    callable: Value,
    args: Vec<Value>,
}

impl Partial {
    /// Bind `args` as the leading arguments of `callable`.
    pub fn new(callable: Value, args: Vec<Value>) -> Self {
        Self { callable, args }
    }

    /// The underlying callable.
    pub fn callable(&self) -> &Value {
        &self.callable
    }

    /// The bound leading arguments.
    pub fn bound_args(&self) -> &[Value] {
        &self.args
    }
}

/// An immutable named bag of attributes, e.g. the `math` module.
#[derive(Debug)]
pub struct Module {
    name: Rc<str>,
    attrs: HashMap<String, Value>,
}

impl Module {
    /// Build a module from its attribute table.
    pub fn new(name: impl Into<Rc<str>>, attrs: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self { name: name.into(), attrs: attrs.into_iter().collect() }
    }

    /// The module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute.
    pub fn attr(&self, name: &str) -> Option<Value> {
        self.attrs.get(name).cloned()
    }

    /// Attribute names in sorted order.
    pub fn attr_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attrs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A compiled regular expression value.
#[derive(Debug)]
pub struct RegexpValue {
    regex: Regex,
}

impl RegexpValue {
    /// Wrap an already compiled regex.
    pub fn new(regex: Regex) -> Self {
        Self { regex }
    }

    /// The compiled regex.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// A dynamically typed script value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value.
    Nil,
    /// true / false.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit float.
    Float(f64),
    /// A single byte.
    Byte(u8),
    /// Immutable UTF-8 string.
    String(Rc<str>),
    /// Mutable byte buffer.
    Bytes(Rc<RefCell<Vec<u8>>>),
    /// Mutable ordered list.
    List(Rc<RefCell<Vec<Value>>>),
    /// Mutable map keyed by hashable values.
    Map(Rc<RefCell<MapValue>>),
    /// Mutable set of hashable values.
    Set(Rc<RefCell<SetValue>>),
    /// Compiled closure.
    Function(Rc<Function>),
    /// Host function.
    Builtin(Rc<Builtin>),
    /// Callable with bound leading arguments.
    Partial(Rc<Partial>),
    /// Script-visible error payload.
    Error(Rc<RuntimeError>),
    /// Immutable attribute namespace.
    Module(Rc<Module>),
    /// Closure storage cell. Internal: evaluation results never expose
    /// cells, the VM reads and writes through them.
    Cell(Rc<RefCell<Value>>),
    /// List iterator.
    ListIter(Rc<RefCell<ListIter>>),
    /// Map iterator.
    MapIter(Rc<RefCell<MapIter>>),
    /// Set iterator.
    SetIter(Rc<RefCell<SetIter>>),
    /// String iterator.
    StringIter(Rc<RefCell<StringIter>>),
    /// Key/value pair produced by iteration.
    Entry(Rc<IterEntry>),
    /// Wrapped host object with a registered dispatch table.
    Proxy(Rc<ProxyObject>),
    /// Signed span of time.
    Duration(chrono::Duration),
    /// Instant in time (UTC).
    Time(DateTime<Utc>),
    /// Compiled regular expression.
    Regexp(Rc<RegexpValue>),
}

impl Value {
    /// The nil singleton.
    pub const NIL: Value = Value::Nil;
    /// The true singleton.
    pub const TRUE: Value = Value::Bool(true);
    /// The false singleton.
    pub const FALSE: Value = Value::Bool(false);

    /// String value from anything string-like.
    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    /// List value from a vector of elements.
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    /// Byte-buffer value.
    pub fn bytes(data: Vec<u8>) -> Value {
        Value::Bytes(Rc::new(RefCell::new(data)))
    }

    /// Empty map value.
    pub fn empty_map() -> Value {
        Value::Map(Rc::new(RefCell::new(MapValue::new())))
    }

    /// Map value from an existing table.
    pub fn map(map: MapValue) -> Value {
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Set value from an existing table.
    pub fn set(set: SetValue) -> Value {
        Value::Set(Rc::new(RefCell::new(set)))
    }

    /// Set value from elements; fails on the first unhashable element.
    pub fn set_from(items: impl IntoIterator<Item = Value>) -> Result<Value, RuntimeError> {
        let mut set = SetValue::new();
        for item in items {
            set.add(item)?;
        }
        Ok(Value::set(set))
    }

    /// Error value from a runtime error.
    pub fn error(err: RuntimeError) -> Value {
        Value::Error(Rc::new(err))
    }

    /// Builtin value from a named closure.
    pub fn builtin(b: Builtin) -> Value {
        Value::Builtin(Rc::new(b))
    }

    /// Module value.
    pub fn module(m: Module) -> Value {
        Value::Module(Rc::new(m))
    }

    /// Regexp value; the pattern is compiled eagerly.
    pub fn regexp(pattern: &str) -> Result<Value, RuntimeError> {
        let regex = Regex::new(pattern)
            .map_err(|err| RuntimeError::value_error(format!("invalid regexp: {err}")))?;
        Ok(Value::Regexp(Rc::new(RegexpValue::new(regex))))
    }

    /// Fresh closure cell holding `inner`.
    pub fn cell(inner: Value) -> Value {
        Value::Cell(Rc::new(RefCell::new(inner)))
    }

    /// The type tag.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Nil => Type::Nil,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Byte(_) => Type::Byte,
            Value::String(_) => Type::String,
            Value::Bytes(_) => Type::Bytes,
            Value::List(_) => Type::List,
            Value::Map(_) => Type::Map,
            Value::Set(_) => Type::Set,
            Value::Function(_) => Type::Function,
            Value::Builtin(_) => Type::Builtin,
            Value::Partial(_) => Type::Partial,
            Value::Error(_) => Type::Error,
            Value::Module(_) => Type::Module,
            Value::Cell(_) => Type::Cell,
            Value::ListIter(_) => Type::ListIter,
            Value::MapIter(_) => Type::MapIter,
            Value::SetIter(_) => Type::SetIter,
            Value::StringIter(_) => Type::StringIter,
            Value::Entry(_) => Type::IterEntry,
            Value::Proxy(_) => Type::Proxy,
            Value::Duration(_) => Type::Duration,
            Value::Time(_) => Type::Time,
            Value::Regexp(_) => Type::Regexp,
        }
    }

    /// Shorthand for `type_of().name()`, used in error messages.
    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    /// REPL-facing rendering. Containers recurse; map and set contents
    /// render in a deterministic key order.
    pub fn inspect(&self) -> String {
        match self {
            Value::Nil => "nil".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => format_float(*x),
            Value::Byte(b) => b.to_string(),
            Value::String(s) => format!("{s:?}"),
            Value::Bytes(b) => {
                let items: Vec<String> = b.borrow().iter().map(|b| b.to_string()).collect();
                format!("bytes([{}])", items.join(", "))
            }
            Value::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(Value::inspect).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Map(map) => {
                let parts: Vec<String> = map
                    .borrow()
                    .sorted_entries()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Set(set) => {
                let items = set.borrow().sorted_items();
                if items.is_empty() {
                    "set()".to_string()
                } else {
                    let parts: Vec<String> = items.iter().map(Value::inspect).collect();
                    format!("{{{}}}", parts.join(", "))
                }
            }
            Value::Function(f) => f.unit().signature(),
            Value::Builtin(b) => format!("builtin({})", b.name()),
            Value::Partial(p) => format!("partial({})", p.callable().inspect()),
            Value::Error(e) => format!("error({:?})", e.message()),
            Value::Module(m) => format!("module({})", m.name()),
            Value::Cell(inner) => format!("cell({})", inner.borrow().inspect()),
            Value::ListIter(_) => "list_iter()".to_string(),
            Value::MapIter(_) => "map_iter()".to_string(),
            Value::SetIter(_) => "set_iter()".to_string(),
            Value::StringIter(_) => "string_iter()".to_string(),
            Value::Entry(e) => {
                format!("iter_entry({}, {})", e.key().inspect(), e.value().inspect())
            }
            Value::Proxy(p) => format!("proxy({})", p.type_name()),
            Value::Duration(d) => format!("duration(\"{}\")", format_duration(*d)),
            Value::Time(t) => {
                format!("time(\"{}\")", t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Regexp(r) => format!("regexp({:?})", r.pattern()),
        }
    }

    /// Export to the generic structural form handed to hosts. Best
    /// effort: callables and iterators export descriptive strings.
    pub fn to_native(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Nil => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(x) => serde_json::Number::from_f64(*x).map_or(Json::Null, Json::Number),
            Value::Byte(b) => Json::from(*b),
            Value::String(s) => Json::String(s.to_string()),
            Value::Bytes(b) => Json::Array(b.borrow().iter().map(|b| Json::from(*b)).collect()),
            Value::List(items) => {
                Json::Array(items.borrow().iter().map(Value::to_native).collect())
            }
            Value::Map(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map.borrow().sorted_entries() {
                    object.insert(native_key(&key), value.to_native());
                }
                Json::Object(object)
            }
            Value::Set(set) => {
                Json::Array(set.borrow().sorted_items().iter().map(Value::to_native).collect())
            }
            Value::Error(e) => {
                let mut object = serde_json::Map::new();
                object.insert("error".to_string(), Json::String(e.message().to_string()));
                object.insert("kind".to_string(), Json::String(e.kind().name().to_string()));
                Json::Object(object)
            }
            Value::Duration(d) => serde_json::Number::from_f64(duration_seconds(*d))
                .map_or(Json::Null, Json::Number),
            Value::Time(t) => Json::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Regexp(r) => Json::String(r.pattern().to_string()),
            Value::Proxy(p) => {
                let mut object = serde_json::Map::new();
                object.insert("type".to_string(), Json::String(p.type_name().to_string()));
                object.insert("repr".to_string(), Json::String(self.inspect()));
                Json::Object(object)
            }
            Value::Function(_)
            | Value::Builtin(_)
            | Value::Partial(_)
            | Value::Module(_)
            | Value::Cell(_)
            | Value::ListIter(_)
            | Value::MapIter(_)
            | Value::SetIter(_)
            | Value::StringIter(_)
            | Value::Entry(_) => Json::String(self.inspect()),
        }
    }

    /// The full truthiness catalog.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            // NaN is truthy: only exact zero is falsy.
            Value::Float(x) => *x != 0.0,
            Value::Byte(b) => *b != 0,
            Value::String(s) => !s.is_empty(),
            Value::Bytes(b) => !b.borrow().is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Map(map) => !map.borrow().is_empty(),
            Value::Set(set) => !set.borrow().is_empty(),
            Value::Function(_) | Value::Builtin(_) | Value::Partial(_) => true,
            Value::Error(_) | Value::Module(_) => true,
            Value::Cell(inner) => inner.borrow().is_truthy(),
            Value::ListIter(_) | Value::MapIter(_) | Value::SetIter(_) | Value::StringIter(_) => {
                true
            }
            Value::Entry(_) => true,
            Value::Proxy(p) => !p.is_zero(),
            Value::Duration(d) => !d.is_zero(),
            Value::Time(_) => true,
            Value::Regexp(_) => true,
        }
    }

    /// Value equality. Strict about type tags: values of different types
    /// are never equal, including int and float of equal magnitude.
    /// Containers compare element-wise; callables and proxies compare by
    /// identity; NaN is unequal to itself.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.entries().all(|(key, value)| {
                        b.get_by_hash(key).is_some_and(|v| v.equals(value))
                    })
            }
            (Value::Set(a), Value::Set(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.hash_keys().all(|key| b.contains_hash(key))
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Partial(a), Value::Partial(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::Cell(a), Value::Cell(b)) => Rc::ptr_eq(a, b),
            (Value::ListIter(a), Value::ListIter(b)) => Rc::ptr_eq(a, b),
            (Value::MapIter(a), Value::MapIter(b)) => Rc::ptr_eq(a, b),
            (Value::SetIter(a), Value::SetIter(b)) => Rc::ptr_eq(a, b),
            (Value::StringIter(a), Value::StringIter(b)) => Rc::ptr_eq(a, b),
            (Value::Entry(a), Value::Entry(b)) => {
                a.key().equals(b.key()) && a.value().equals(b.value())
            }
            (Value::Proxy(a), Value::Proxy(b)) => a.same_target(b),
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Regexp(a), Value::Regexp(b)) => a.pattern() == b.pattern(),
            _ => false,
        }
    }

    /// Evaluation cost charged against a run budget. Scalars cost one
    /// unit; strings and buffers scale with length; containers sum their
    /// elements. Recursion is depth-capped so cyclic containers cannot
    /// hang the accounting.
    pub fn cost(&self) -> usize {
        self.cost_at_depth(0)
    }

    fn cost_at_depth(&self, depth: u8) -> usize {
        if depth > 8 {
            return 1;
        }
        match self {
            Value::String(s) => 1 + s.len(),
            Value::Bytes(b) => 1 + b.borrow().len(),
            Value::List(items) => {
                1 + items.borrow().iter().map(|v| v.cost_at_depth(depth + 1)).sum::<usize>()
            }
            Value::Map(map) => {
                1 + map
                    .borrow()
                    .entries()
                    .map(|(_, v)| 1 + v.cost_at_depth(depth + 1))
                    .sum::<usize>()
            }
            Value::Set(set) => 1 + set.borrow().len(),
            Value::Cell(inner) => inner.borrow().cost_at_depth(depth + 1),
            _ => 1,
        }
    }

    /// Static-table attribute lookup: bound methods and computed
    /// properties. Proxies resolve through [`Value::attr_resolver`]
    /// instead.
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        match self {
            Value::String(s) => attrs::string::attr(s, name),
            Value::List(items) => attrs::list::attr(items, name),
            Value::Map(map) => attrs::map::attr(map, name),
            Value::Set(set) => attrs::set::attr(set, name),
            Value::Bytes(b) => attrs::bytes::attr(b, name),
            Value::Time(t) => attrs::time::time_attr(*t, name),
            Value::Duration(d) => attrs::time::duration_attr(*d, name),
            Value::Regexp(r) => attrs::regexp::attr(r, name),
            Value::Error(e) => match name {
                "message" => Some(Value::string(e.message())),
                "kind" => Some(Value::string(e.kind().name())),
                _ => None,
            },
            Value::Module(m) => m.attr(name),
            Value::Function(f) => match name {
                "name" => Some(Value::string(f.name())),
                _ => None,
            },
            Value::Builtin(b) => match name {
                "name" => Some(Value::string(b.name())),
                _ => None,
            },
            Value::Entry(e) => match name {
                "key" => Some(e.key().clone()),
                "value" => Some(e.value().clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Assign an attribute. Only proxy fields with registered setters
    /// are assignable.
    pub fn set_attr(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        match self {
            Value::Proxy(p) => p.set_attr(name, &value),
            Value::Module(m) => Err(RuntimeError::attr_error(format!(
                "attributes of module {} are read-only",
                m.name()
            ))),
            _ => Err(RuntimeError::attr_error(format!(
                "cannot set attribute {:?} on {}",
                name,
                self.type_name()
            ))),
        }
    }

    /// The dynamic attribute-resolution capability, if this value has
    /// one. Consulted after `get_attr` misses.
    pub fn attr_resolver(&self) -> Option<&dyn crate::attrs::AttrResolver> {
        match self {
            Value::Proxy(p) => Some(p.as_ref()),
            _ => None,
        }
    }

    /// True for the error variant.
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// True for nil.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// True for values the VM knows how to call.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_) | Value::Partial(_))
    }

    /// Int payload, without coercion.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, without coercion.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// Bool payload, without coercion.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String payload, without coercion.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Semantic equality, so tests and hosts can use `==` directly.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_native().serialize(serializer)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<RuntimeError> for Value {
    fn from(err: RuntimeError) -> Self {
        Value::error(err)
    }
}

fn format_float(x: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format(x).to_string()
}

fn native_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.to_string(),
        other => other.inspect(),
    }
}

pub(crate) fn duration_seconds(d: chrono::Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

/// Go-style duration rendering with millisecond precision: `1h2m3.5s`.
pub(crate) fn format_duration(d: chrono::Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    let negative = d < chrono::Duration::zero();
    let mut ms = d.num_milliseconds().abs();
    let hours = ms / 3_600_000;
    ms %= 3_600_000;
    let minutes = ms / 60_000;
    ms %= 60_000;
    let seconds = ms as f64 / 1000.0;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds != 0.0 || (hours == 0 && minutes == 0) {
        out.push_str(&format!("{seconds}s"));
    }
    out
}
