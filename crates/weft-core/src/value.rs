#![forbid(unsafe_code)]

//! The reactive state tree.
//!
//! A [`Value`] is either a scalar or an [`Object`]. Objects are shared
//! handles to an ordered list of reactive properties; each property owns the
//! current value and the [`Dep`] that tracks who read it.
//!
//! # Invariants
//!
//! 1. A property keeps the same `Dep` for its whole lifetime; assigning a new
//!    value never replaces it.
//! 2. Reads register the active subscriber (see [`crate::tracking`]); writes
//!    notify only when the new value is not [identical](Value::identical)
//!    to the old one.
//! 3. Objects reachable from a `Value` are always reactive: the only way to
//!    build one from plain data is through [`StateObserver`](crate::StateObserver).
//!
//! # Failure Modes
//!
//! - Writing a key that does not exist defines a new reactive property and
//!   notifies nobody (no one can have read it).
//! - Reading a key that does not exist yields `None` and registers nothing.
//! - An object may be stored inside itself. JSON snapshots, `Display` and
//!   `Debug` render the inner repeat as `null` instead of recursing.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::dep::Dep;
use crate::error::ReactiveError;
use crate::tracking;

/// A node of the state tree.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent or explicitly null.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar.
    Number(f64),
    /// String scalar.
    String(Rc<str>),
    /// Composite value with reactive properties.
    Object(Object),
}

impl Value {
    /// Strict identity: scalars by value, objects by handle.
    ///
    /// `NaN` is never identical to itself, and two distinct objects with
    /// equal contents are not identical.
    #[must_use]
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Short type name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(obj) if obj.is_array() => "array",
            Value::Object(_) => "object",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Snapshot as plain JSON. Does not register dependencies.
    ///
    /// An object that contains itself is cut at the repeat, which becomes
    /// `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_within(&mut Ancestors::new())
    }

    fn to_json_within(&self, ancestors: &mut Ancestors) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => json_number(*n),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Object(obj) => obj.to_json_within(ancestors),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write_number(f, *n),
            Value::String(s) => f.write_str(s),
            Value::Object(obj) => write!(f, "{}", obj.to_json()),
        }
    }
}

/// Numbers render the way script engines print them: `-0` as `0`, and
/// exponent notation (`1e-7`, `1.5e+21`) outside `[1e-6, 1e21)`.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return f.write_str("NaN");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    if n == 0.0 {
        return f.write_str("0");
    }
    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{n}");
    }
    let exponent = format!("{n:e}");
    match exponent.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => write!(f, "{mantissa}e+{power}"),
        _ => f.write_str(&exponent),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn json_number(n: f64) -> serde_json::Value {
    // Integral values go back to integer JSON so snapshots match their source.
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Object(obj) => write!(f, "Object({})", obj.to_json()),
        }
    }
}

/// Equality is [`Value::identical`]: objects compare by handle.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<serde_json::Value> for Value {
    fn from(raw: serde_json::Value) -> Self {
        crate::observer::StateObserver::observe(raw)
    }
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// Whether an [`Object`] was observed from a map or from an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Map,
    Array,
}

/// One reactive key of an [`Object`].
struct Property {
    key: Rc<str>,
    value: RefCell<Value>,
    dep: Dep,
}

/// Handles of the objects currently being serialized, outermost first.
type Ancestors = SmallVec<[*const ObjectInner; 8]>;

struct ObjectInner {
    kind: ObjectKind,
    properties: RefCell<Vec<Rc<Property>>>,
}

/// Shared handle to a composite node of the state tree.
///
/// Cloning an `Object` yields another handle to the **same** properties;
/// [`Value::identical`] compares handles, not contents.
#[derive(Clone)]
pub struct Object {
    inner: Rc<ObjectInner>,
}

impl Object {
    pub(crate) fn new(kind: ObjectKind) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                kind,
                properties: RefCell::new(Vec::new()),
            }),
        }
    }

    fn property(&self, key: &str) -> Option<Rc<Property>> {
        self.inner
            .properties
            .borrow()
            .iter()
            .find(|p| &*p.key == key)
            .cloned()
    }

    /// Install `key` as a reactive property holding `value`.
    ///
    /// Callers guarantee `key` is not present yet. `value` is already
    /// reactive (objects are built bottom-up), so the new property only needs
    /// its own `Dep`.
    pub(crate) fn define_reactive(&self, key: &str, value: Value) {
        let property = Rc::new(Property {
            key: Rc::from(key),
            value: RefCell::new(value),
            dep: Dep::new(),
        });
        self.inner.properties.borrow_mut().push(property);
    }

    /// Read `key`, registering the active subscriber on its `Dep`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let property = self.property(key)?;
        if let Some(subscriber) = tracking::active() {
            property.dep.add_subscriber(&subscriber);
        }
        let value = property.value.borrow().clone();
        Some(value)
    }

    /// Read `key` without registering anything.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.property(key).map(|p| p.value.borrow().clone())
    }

    /// Write `key`.
    ///
    /// Identical values are ignored. Otherwise the value is replaced and every
    /// subscriber of the property is updated before this returns.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a subscriber's re-evaluation. The
    /// write itself has already happened.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ReactiveError> {
        let value = value.into();
        let Some(property) = self.property(key) else {
            tracing::trace!(message = "object.define", key);
            self.define_reactive(key, value);
            return Ok(());
        };

        {
            let mut current = property.value.borrow_mut();
            if current.identical(&value) {
                return Ok(());
            }
            *current = value;
        }
        tracing::trace!(message = "object.set", key);
        property.dep.notify()
    }

    /// Whether `key` exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// Keys in definition order.
    #[must_use]
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.inner
            .properties
            .borrow()
            .iter()
            .map(|p| Rc::clone(&p.key))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.properties.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.properties.borrow().is_empty()
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.inner.kind
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.inner.kind == ObjectKind::Array
    }

    /// Whether both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Live subscribers of `key`, or `None` if the key does not exist.
    #[must_use]
    pub fn subscriber_count(&self, key: &str) -> Option<usize> {
        self.property(key).map(|p| p.dep.subscriber_count())
    }

    /// Snapshot as plain JSON. Does not register dependencies.
    ///
    /// See [`Value::to_json`] for how cycles are cut.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_within(&mut Ancestors::new())
    }

    fn to_json_within(&self, ancestors: &mut Ancestors) -> serde_json::Value {
        let handle = Rc::as_ptr(&self.inner);
        if ancestors.contains(&handle) {
            tracing::trace!(message = "object.to_json.cycle", len = ancestors.len());
            return serde_json::Value::Null;
        }
        ancestors.push(handle);
        let properties = self.inner.properties.borrow();
        let json = match self.inner.kind {
            ObjectKind::Array => serde_json::Value::Array(
                properties
                    .iter()
                    .map(|p| p.value.borrow().to_json_within(ancestors))
                    .collect(),
            ),
            ObjectKind::Map => serde_json::Value::Object(
                properties
                    .iter()
                    .map(|p| (p.key.to_string(), p.value.borrow().to_json_within(ancestors)))
                    .collect(),
            ),
        };
        ancestors.pop();
        json
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("kind", &self.inner.kind)
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(raw: serde_json::Value) -> Object {
        match Value::from(raw) {
            Value::Object(obj) => obj,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn identical_scalars_compare_by_value() {
        assert!(Value::from(1).identical(&Value::from(1.0)));
        assert!(Value::from("a").identical(&Value::from("a".to_string())));
        assert!(Value::Null.identical(&Value::Null));
        assert!(!Value::from(1).identical(&Value::from("1")));
        assert!(!Value::Number(f64::NAN).identical(&Value::Number(f64::NAN)));
    }

    #[test]
    fn identical_objects_compare_by_handle() {
        let a = object(json!({ "x": 1 }));
        let b = object(json!({ "x": 1 }));
        assert!(Value::Object(a.clone()).identical(&Value::Object(a.clone())));
        assert!(!Value::Object(a).identical(&Value::Object(b)));
    }

    #[test]
    fn display_matches_rendered_text() {
        assert_eq!(Value::from(1).to_string(), "1");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::from(-3).to_string(), "-3");
        assert_eq!(Value::from(1e-7).to_string(), "1e-7");
        assert_eq!(Value::from(1.5e21).to_string(), "1.5e+21");
        assert_eq!(Value::from(0.000_001).to_string(), "0.000001");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(json!({ "a": [1, 2] })).to_string(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn self_containing_object_renders_repeat_as_null() {
        let obj = object(json!({ "a": 1 }));
        obj.set("me", Value::Object(obj.clone())).unwrap();
        assert_eq!(obj.to_json(), json!({ "a": 1, "me": null }));
        assert_eq!(Value::Object(obj.clone()).to_string(), r#"{"a":1,"me":null}"#);
        assert!(format!("{:?}", Value::Object(obj.clone())).contains("null"));

        // Siblings sharing one handle are not a cycle.
        let shared = object(json!({ "x": 2 }));
        let holder = object(json!({}));
        holder.set("left", Value::Object(shared.clone())).unwrap();
        holder.set("right", Value::Object(shared)).unwrap();
        assert_eq!(
            holder.to_json(),
            json!({ "left": { "x": 2 }, "right": { "x": 2 } })
        );
        obj.set("me", Value::Null).unwrap();
    }

    #[test]
    fn set_identical_value_is_ignored() {
        let obj = object(json!({ "x": 1 }));
        obj.set("x", 1).unwrap();
        assert_eq!(obj.peek("x").and_then(|v| v.as_f64()), Some(1.0));
    }

    #[test]
    fn set_missing_key_defines_property() {
        let obj = object(json!({}));
        obj.set("fresh", "v").unwrap();
        assert!(obj.contains_key("fresh"));
        assert_eq!(obj.subscriber_count("fresh"), Some(0));
        assert_eq!(obj.keys().len(), 1);
    }

    #[test]
    fn arrays_keep_index_keys() {
        let obj = object(json!(["a", "b"]));
        assert!(obj.is_array());
        assert_eq!(obj.peek("1").and_then(|v| v.as_str().map(String::from)), Some("b".into()));
        assert_eq!(obj.to_json(), json!(["a", "b"]));
    }

    #[test]
    fn read_outside_evaluation_registers_nothing() {
        let obj = object(json!({ "x": 1 }));
        let _ = obj.get("x");
        assert_eq!(obj.subscriber_count("x"), Some(0));
    }
}
