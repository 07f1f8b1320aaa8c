#![forbid(unsafe_code)]

//! The view-model: observed state, compiled template, event methods.
//!
//! # Architecture
//!
//! ```text
//! Options ──► StateObserver::observe ──► state (reactive Value)
//!    │                                       ▲
//!    └─► attach target ──► Compiler ─────────┘ watchers held in BindingScope
//!                              │
//!                              └─► Dom listeners ──► MethodTable ──► Method(&ViewModel, &Event)
//! ```
//!
//! The method table reaches the view-model through a weak handle, so
//! listeners never keep it alive.
//!
//! # Invariants
//!
//! 1. `vm.get(k)` is the same value as reading `k` on the state root.
//! 2. Writes through the view-model notify exactly like writes on the
//!    state; there is no second reactive layer.
//! 3. Dropping the last handle releases every binding and the listeners
//!    registered under the attach root.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Selector matches nothing | bad `attach` | [`Error::AttachTargetNotFound`] |
//! | Bad directive or path | template error | [`Error::Bind`], no bindings kept |
//! | Unknown method fired | `@click="nope"` | [`BindError::MissingHandler`] from dispatch |
//! | Event after drop | view-model gone | no-op, traced at `debug` |

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use weft_core::{BindingScope, Object, ReactiveError, StateObserver, Value, Watcher, path};
use weft_dom::{Dom, NodeId};
use weft_template::{BindError, CompileStats, Compiler, Event, MethodDispatch};

use crate::error::Error;
use crate::options::{AttachTarget, Method, Options};

struct VmInner {
    dom: Dom,
    root: Option<NodeId>,
    state: Value,
    object: Object,
    methods: AHashMap<String, Method>,
    scope: RefCell<BindingScope>,
    stats: Cell<CompileStats>,
}

impl Drop for VmInner {
    fn drop(&mut self) {
        if let Some(root) = self.root {
            self.dom.clear_listeners_within(root);
        }
    }
}

/// Resolves event methods against a view-model that may be gone.
struct MethodTable {
    vm: Weak<VmInner>,
}

impl MethodDispatch for MethodTable {
    fn invoke(&self, name: &str, event: &Event) -> Result<(), BindError> {
        let Some(inner) = self.vm.upgrade() else {
            tracing::debug!(message = "vm.event.dropped", method = name, event = %event.name);
            return Ok(());
        };
        let method = inner
            .methods
            .get(name)
            .cloned()
            .ok_or_else(|| BindError::MissingHandler {
                name: name.to_string(),
            })?;
        tracing::debug!(message = "vm.method", method = name, event = %event.name);
        method(&ViewModel { inner }, event)
    }
}

/// Live binding between a state tree and a document subtree.
///
/// Cloning yields another handle to the same view-model.
#[derive(Clone)]
pub struct ViewModel {
    inner: Rc<VmInner>,
}

impl ViewModel {
    /// Observe the state and, when an attach target is set, compile the
    /// template below it.
    ///
    /// # Errors
    ///
    /// [`Error::AttachTargetNotFound`], [`Error::Config`] for non-object
    /// state, or [`Error::Bind`] from compilation.
    pub fn new(dom: Dom, mut options: Options) -> crate::Result<Self> {
        let state = StateObserver::observe(options.take_state()?);
        let object = state.as_object().cloned().ok_or_else(|| Error::Config {
            message: format!("state must be an object, got {}", state.type_name()),
            source: None,
        })?;
        let root = match &options.attach {
            None => None,
            Some(AttachTarget::Node(node)) => Some(*node),
            Some(AttachTarget::Selector(selector)) => Some(
                dom.query_selector(selector)
                    .ok_or_else(|| Error::AttachTargetNotFound {
                        selector: selector.clone(),
                    })?,
            ),
        };

        let inner = Rc::new(VmInner {
            dom,
            root,
            state,
            object,
            methods: std::mem::take(&mut options.methods),
            scope: RefCell::new(BindingScope::new()),
            stats: Cell::new(CompileStats::default()),
        });

        if let Some(root) = root {
            let methods: Rc<dyn MethodDispatch> = Rc::new(MethodTable {
                vm: Rc::downgrade(&inner),
            });
            let compiled = Compiler::new(inner.dom.clone())
                .with_syntax(options.syntax)
                .compile(root, &inner.state, &methods)?;
            *inner.scope.borrow_mut() = compiled.scope;
            inner.stats.set(compiled.stats);
        }

        tracing::debug!(
            message = "vm.create",
            attached = root.is_some(),
            bindings = inner.scope.borrow().binding_count(),
        );
        Ok(Self { inner })
    }

    /// Current value of top-level property `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.object.get(key)
    }

    /// Write top-level property `key`, defining it when missing.
    ///
    /// # Errors
    ///
    /// Errors raised by subscribed bindings.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ReactiveError> {
        self.inner.object.set(key, value)
    }

    /// Resolve a dotted path against the state.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::PathResolution`] when the path cannot be resolved.
    pub fn get_path(&self, path: &str) -> Result<Value, ReactiveError> {
        path::get_value(path, &self.inner.state)
    }

    /// Assign at a dotted path.
    ///
    /// # Errors
    ///
    /// Bad paths or binding errors.
    pub fn set_path(&self, path: &str, value: impl Into<Value>) -> Result<(), ReactiveError> {
        path::set_value(path, &self.inner.state, value)
    }

    /// Top-level state keys in definition order.
    #[must_use]
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.inner.object.keys()
    }

    /// Watch `expr` with a callback the caller keeps alive by holding the
    /// returned watcher.
    ///
    /// # Errors
    ///
    /// Any error from the initial evaluation.
    pub fn watch(
        &self,
        expr: &str,
        callback: impl Fn(&Value) -> Result<(), ReactiveError> + 'static,
    ) -> Result<Watcher, ReactiveError> {
        Watcher::new(expr, self.inner.state.clone(), callback)
    }

    /// The reactive state root.
    #[must_use]
    pub fn state(&self) -> &Value {
        &self.inner.state
    }

    /// Plain JSON snapshot of the state.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.inner.state.to_json()
    }

    #[must_use]
    pub fn dom(&self) -> &Dom {
        &self.inner.dom
    }

    /// The attach root, if a template was compiled.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.inner.root
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.inner.scope.borrow().binding_count()
    }

    #[must_use]
    pub fn stats(&self) -> CompileStats {
        self.inner.stats.get()
    }
}

impl std::fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewModel")
            .field("root", &self.inner.root)
            .field("keys", &self.keys())
            .field("bindings", &self.binding_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn vm(markup: &str, options: Options) -> ViewModel {
        ViewModel::new(Dom::parse(markup).unwrap(), options).unwrap()
    }

    #[test]
    fn pass_through_reads_and_writes() {
        let vm = vm("", Options::new().state(json!({ "x": 1, "y": { "z": 2 } })));
        assert_eq!(vm.get("x"), Some(Value::from(1)));
        assert_eq!(vm.get_path("y.z").unwrap(), Value::from(2));
        assert_eq!(vm.get("missing"), None);

        vm.set("x", 5).unwrap();
        assert_eq!(vm.get("x"), Some(Value::from(5)));
        vm.set("fresh", "new").unwrap();
        assert_eq!(
            vm.keys().iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            vec!["x", "y", "fresh"]
        );
    }

    #[test]
    fn no_attach_means_no_bindings() {
        let vm = vm("<p>{{ x }}</p>", Options::new().state(json!({ "x": 1 })));
        assert_eq!(vm.root(), None);
        assert_eq!(vm.binding_count(), 0);
        let p = vm.dom().query_selector("p").unwrap();
        assert_eq!(vm.dom().text_content(p), "{{ x }}");
    }

    #[test]
    fn missing_attach_target() {
        let err = ViewModel::new(Dom::new(), Options::new().attach("#nope")).unwrap_err();
        assert!(matches!(err, Error::AttachTargetNotFound { selector } if selector == "#nope"));
    }

    #[test]
    fn attach_by_node() {
        let dom = Dom::parse("<main><p>{{ x }}</p></main>").unwrap();
        let main = dom.query_selector("main").unwrap();
        let vm = ViewModel::new(dom, Options::new().attach(main).state(json!({ "x": 3 }))).unwrap();
        assert_eq!(vm.dom().inner_html(main), "<p>3</p>");
        assert_eq!(vm.stats().text_nodes, 1);
    }

    #[test]
    fn method_receives_view_model() {
        let vm = vm(
            r#"<div id="app"><button @click="inc">{{ n }}</button></div>"#,
            Options::new()
                .attach("#app")
                .state(json!({ "n": 0 }))
                .method("inc", |vm, _| {
                    let n = vm.get("n").and_then(|v| v.as_f64()).unwrap_or_default();
                    vm.set("n", n + 1.0)?;
                    Ok(())
                }),
        );
        let button = vm.dom().query_selector("button").unwrap();
        vm.dom().dispatch(button, "click", Value::Null).unwrap();
        vm.dom().dispatch(button, "click", Value::Null).unwrap();
        assert_eq!(vm.dom().text_content(button), "2");
    }

    #[test]
    fn drop_releases_listeners() {
        let dom = Dom::parse(r#"<div id="app"><input bind-value="v" @change="noop"></div>"#).unwrap();
        let input = dom.query_selector("input").unwrap();
        let vm = ViewModel::new(
            dom.clone(),
            Options::new()
                .attach("#app")
                .state(json!({ "v": "a" }))
                .method("noop", |_, _| Ok(())),
        )
        .unwrap();
        assert_eq!(dom.listener_count(input), 2);
        drop(vm);
        assert_eq!(dom.listener_count(input), 0);
        assert!(dom.dispatch(input, "change", Value::Null).is_ok());
    }

    #[test]
    #[traced_test]
    fn creation_is_logged() {
        let _vm = vm("<div id=\"app\"></div>", Options::new().attach("#app"));
        assert!(logs_contain("vm.create"));
    }
}
