#![forbid(unsafe_code)]

//! Turning plain data into a reactive state tree.
//!
//! [`StateObserver::observe`] walks a `serde_json::Value` and builds the
//! matching [`Value`], making every key of every nested map or array a
//! reactive property. Children are observed before their parent key is
//! defined, so a subtree is fully reactive before it becomes reachable.
//!
//! Scalars and `null` pass through unchanged.

use crate::value::{Object, ObjectKind, Value};

/// Builds reactive objects from plain data.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateObserver;

impl StateObserver {
    /// Convert `raw` into a reactive [`Value`].
    #[must_use]
    pub fn observe(raw: serde_json::Value) -> Value {
        match raw {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Object(map) => {
                let object = Object::new(ObjectKind::Map);
                for (key, child) in map {
                    Self::define_reactive(&object, &key, child);
                }
                Value::Object(object)
            }
            serde_json::Value::Array(items) => {
                let object = Object::new(ObjectKind::Array);
                for (index, child) in items.into_iter().enumerate() {
                    Self::define_reactive(&object, &index.to_string(), child);
                }
                Value::Object(object)
            }
        }
    }

    /// Observe `initial` and install it on `container` under `key`.
    fn define_reactive(container: &Object, key: &str, initial: serde_json::Value) {
        let value = Self::observe(initial);
        tracing::trace!(message = "observer.define", key, kind = value.type_name());
        container.define_reactive(key, value);
    }
}
