//! Proxy values: host Rust objects exposed to scripts.
//!
//! There is no runtime reflection to lean on, so a host type opts in by
//! registering a [`ProxyType`] dispatch table once, built with
//! [`ProxyTypeBuilder`]: field getters, optional field setters, method
//! thunks, and a truthiness hook. Tables are keyed by `TypeId` in a
//! process-wide registry; [`new_proxy`] wraps a host value together with
//! its table, and attribute resolution consults only that table, so no
//! per-access discovery happens.
//!
//! Method thunks receive the downcast receiver and the raw argument
//! slice; the [`FromValue`] conversions marshal arguments into host
//! types. A thunk's `Err` comes back to the script as an error value
//! carrying the host message.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::attrs::AttrResolver;
use crate::context::{Builtin, RunContext};
use crate::errors::RuntimeError;
use crate::value::Value;

type Getter = Box<dyn Fn(&dyn Any) -> Value + Send + Sync>;
type Setter = Box<dyn Fn(&mut dyn Any, Value) -> Result<(), RuntimeError> + Send + Sync>;
type MethodThunk = Arc<dyn Fn(&mut dyn Any, &[Value]) -> Result<Value, RuntimeError> + Send + Sync>;
type ZeroPredicate = Box<dyn Fn(&dyn Any) -> bool + Send + Sync>;

struct FieldSlot {
    getter: Getter,
    setter: Option<Setter>,
}

/// Conversion from script values into host argument types, used by
/// method thunks and field setters to marshal their inputs.
pub trait FromValue: Sized {
    /// Convert, or fail with a type error naming the mismatch.
    fn from_value(value: &Value) -> Result<Self, RuntimeError>;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Byte(b) => Ok(*b as i64),
            other => Err(RuntimeError::type_error(format!(
                "expected an int (got {})",
                other.type_name()
            ))),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        match value {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            Value::Byte(b) => Ok(*b as f64),
            other => Err(RuntimeError::type_error(format!(
                "expected a float (got {})",
                other.type_name()
            ))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(RuntimeError::type_error(format!(
                "expected a bool (got {})",
                other.type_name()
            ))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        match value {
            Value::String(s) => Ok(s.to_string()),
            other => Err(RuntimeError::type_error(format!(
                "expected a string (got {})",
                other.type_name()
            ))),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, RuntimeError> {
        Ok(value.clone())
    }
}

/// The dispatch table for one host type: its script-facing name plus
/// erased accessors keyed by attribute name.
pub struct ProxyType {
    name: String,
    target: TypeId,
    fields: HashMap<String, FieldSlot>,
    methods: HashMap<String, MethodThunk>,
    is_zero: Option<ZeroPredicate>,
}

impl ProxyType {
    /// The script-facing type name, e.g. `Counter` in `proxy(Counter)`.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Builder for a [`ProxyType`] over host type `T`. Accessors take the
/// concrete `T`; the builder erases them behind the table's uniform
/// shape.
pub struct ProxyTypeBuilder<T> {
    name: String,
    fields: HashMap<String, FieldSlot>,
    methods: HashMap<String, MethodThunk>,
    is_zero: Option<ZeroPredicate>,
    _target: PhantomData<fn(T)>,
}

impl<T: Any> ProxyTypeBuilder<T> {
    /// Start a table with the given script-facing name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: HashMap::new(),
            methods: HashMap::new(),
            is_zero: None,
            _target: PhantomData,
        }
    }

    /// A read-only field.
    pub fn field(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldSlot { getter: erase_getter(getter), setter: None },
        );
        self
    }

    /// A field with both a getter and a setter.
    pub fn field_mut(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&T) -> Value + Send + Sync + 'static,
        setter: impl Fn(&mut T, Value) -> Result<(), RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldSlot { getter: erase_getter(getter), setter: Some(erase_setter(setter)) },
        );
        self
    }

    /// A method. The thunk receives the receiver and the raw arguments;
    /// use [`FromValue`] to marshal them.
    pub fn method(
        mut self,
        name: impl Into<String>,
        thunk: impl Fn(&mut T, &[Value]) -> Result<Value, RuntimeError> + Send + Sync + 'static,
    ) -> Self {
        let thunk: MethodThunk = Arc::new(move |any: &mut dyn Any, args: &[Value]| {
            match any.downcast_mut::<T>() {
                Some(target) => thunk(target, args),
                None => Err(receiver_mismatch()),
            }
        });
        self.methods.insert(name.into(), thunk);
        self
    }

    /// Truthiness hook; without one, every proxy of this type is truthy.
    pub fn is_zero(mut self, pred: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.is_zero = Some(Box::new(move |any: &dyn Any| {
            any.downcast_ref::<T>().map(&pred).unwrap_or(false)
        }));
        self
    }

    /// Finish the table.
    pub fn build(self) -> ProxyType {
        ProxyType {
            name: self.name,
            target: TypeId::of::<T>(),
            fields: self.fields,
            methods: self.methods,
            is_zero: self.is_zero,
        }
    }
}

fn erase_getter<T: Any>(getter: impl Fn(&T) -> Value + Send + Sync + 'static) -> Getter {
    Box::new(move |any: &dyn Any| match any.downcast_ref::<T>() {
        Some(target) => getter(target),
        None => Value::error(receiver_mismatch()),
    })
}

fn erase_setter<T: Any>(
    setter: impl Fn(&mut T, Value) -> Result<(), RuntimeError> + Send + Sync + 'static,
) -> Setter {
    Box::new(move |any: &mut dyn Any, value: Value| match any.downcast_mut::<T>() {
        Some(target) => setter(target, value),
        None => Err(receiver_mismatch()),
    })
}

fn receiver_mismatch() -> RuntimeError {
    RuntimeError::host("proxy receiver does not match its dispatch table")
}

type Registry = RwLock<HashMap<TypeId, Arc<ProxyType>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Install a dispatch table, replacing any earlier table for the same
/// host type.
pub fn register_proxy_type(ty: ProxyType) {
    debug!(target: "fjord::proxy", "registered proxy type {}", ty.name);
    registry().write().insert(ty.target, Arc::new(ty));
}

/// Wrap a host value as a proxy. Fails unless a [`ProxyType`] has been
/// registered for `T`.
pub fn new_proxy<T: Any>(value: T) -> Result<Value, RuntimeError> {
    let ty = registry().read().get(&TypeId::of::<T>()).cloned().ok_or_else(|| {
        RuntimeError::type_error(format!(
            "{} cannot be reflected",
            std::any::type_name::<T>()
        ))
    })?;
    Ok(Value::Proxy(Rc::new(ProxyObject { cell: Rc::new(RefCell::new(value)), ty })))
}

/// A host value bound to its dispatch table.
///
/// Equality between proxies is identity of the wrapped cell; cloning the
/// `Value` shares the cell.
pub struct ProxyObject {
    cell: Rc<RefCell<dyn Any>>,
    ty: Arc<ProxyType>,
}

impl ProxyObject {
    /// The registered script-facing type name.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Truthiness hook result; false (truthy proxy) when no hook is
    /// registered.
    pub fn is_zero(&self) -> bool {
        match &self.ty.is_zero {
            Some(pred) => pred(&*self.cell.borrow()),
            None => false,
        }
    }

    /// Whether two proxies wrap the same host cell.
    pub fn same_target(&self, other: &ProxyObject) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }

    /// Assign a field through its registered setter.
    pub fn set_attr(&self, name: &str, value: &Value) -> Result<(), RuntimeError> {
        match self.ty.fields.get(name) {
            Some(slot) => match &slot.setter {
                Some(setter) => setter(&mut *self.cell.borrow_mut(), value.clone()),
                None => Err(RuntimeError::attr_error(format!(
                    "attribute {:?} of {} is not settable",
                    name,
                    self.ty.name()
                ))),
            },
            None => Err(crate::attrs::no_such_attr(self.type_name(), name)),
        }
    }

    fn bind_method(&self, name: &str, thunk: MethodThunk) -> Value {
        let cell = self.cell.clone();
        let label = format!("{}.{}", self.ty.name(), name);
        Value::builtin(Builtin::new(label, move |_env, args| {
            let mut target = cell.borrow_mut();
            match thunk(&mut *target, args) {
                Ok(value) => value,
                Err(err) => Value::error(err),
            }
        }))
    }
}

impl AttrResolver for ProxyObject {
    fn resolve_attr(&self, _ctx: &RunContext, name: &str) -> Result<Value, RuntimeError> {
        if let Some(slot) = self.ty.fields.get(name) {
            return Ok((slot.getter)(&*self.cell.borrow()));
        }
        if let Some(thunk) = self.ty.methods.get(name) {
            return Ok(self.bind_method(name, thunk.clone()));
        }
        Err(crate::attrs::no_such_attr(self.type_name(), name))
    }
}

impl fmt::Debug for ProxyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyObject").field("type", &self.ty.name).finish()
    }
}
