#![forbid(unsafe_code)]

//! A single live binding between one expression and one change callback.
//!
//! # Design
//!
//! Construction evaluates the expression while the watcher sits on top of the
//! tracking stack, so every property read along the path records the watcher
//! in its [`Dep`](crate::Dep). When one of those properties changes,
//! [`Watcher::update`] re-evaluates (again under tracking, picking up any
//! newly reachable properties) and calls the callback if the result is not
//! identical to the last observed value.
//!
//! # Invariants
//!
//! 1. The tracking entry pushed for an evaluation is popped before control
//!    returns, on success and on failure.
//! 2. The callback runs only when the new value is not
//!    [identical](Value::identical) to the previous one.
//! 3. The stored value advances only after the callback succeeds.
//!
//! # Failure Modes
//!
//! - **Evaluation fails** (a segment became a scalar): the error is returned
//!   to the writer that triggered the update; the stored value is unchanged.
//! - **Callback fails**: same, so the next update retries the callback.
//! - **Watcher dropped**: its `Dep` entries die with it and are pruned on
//!   the next notification.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dep::{Subscriber, SubscriberId};
use crate::error::ReactiveError;
use crate::path;
use crate::tracking;
use crate::value::Value;

type Callback = Box<dyn Fn(&Value) -> Result<(), ReactiveError>>;

struct WatcherInner {
    id: SubscriberId,
    expr: Rc<str>,
    root: Value,
    callback: Callback,
    old: RefCell<Value>,
}

impl WatcherInner {
    fn evaluate(self: &Rc<Self>) -> Result<Value, ReactiveError> {
        let _guard = tracking::track(Rc::clone(self) as Rc<dyn Subscriber>);
        path::get_value(&self.expr, &self.root)
    }
}

impl Subscriber for WatcherInner {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn update(self: Rc<Self>) -> Result<(), ReactiveError> {
        let new = self.evaluate()?;
        if self.old.borrow().identical(&new) {
            return Ok(());
        }
        tracing::trace!(message = "watcher.changed", id = self.id.get(), expr = %self.expr);
        (self.callback)(&new)?;
        *self.old.borrow_mut() = new;
        Ok(())
    }
}

/// Handle to a reactive binding.
///
/// The binding stays connected while at least one handle is alive; keep it in
/// a [`BindingScope`](crate::BindingScope) to tie it to a view.
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

impl Watcher {
    /// Bind `expr` (resolved against `root`) to `callback`.
    ///
    /// The initial evaluation subscribes the watcher to every property on the
    /// path; the callback is not invoked for it.
    ///
    /// # Errors
    ///
    /// Any [`ReactiveError`] from the initial evaluation.
    pub fn new(
        expr: &str,
        root: Value,
        callback: impl Fn(&Value) -> Result<(), ReactiveError> + 'static,
    ) -> Result<Self, ReactiveError> {
        let inner = Rc::new(WatcherInner {
            id: SubscriberId::next(),
            expr: Rc::from(expr.trim()),
            root,
            callback: Box::new(callback),
            old: RefCell::new(Value::Null),
        });
        let initial = inner.evaluate()?;
        tracing::debug!(message = "watcher.create", id = inner.id.get(), expr = %inner.expr);
        *inner.old.borrow_mut() = initial;
        Ok(Self { inner })
    }

    /// Re-evaluate now and fire the callback if the value changed.
    ///
    /// # Errors
    ///
    /// Evaluation or callback errors.
    pub fn update(&self) -> Result<(), ReactiveError> {
        Rc::clone(&self.inner).update()
    }

    /// The last observed value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.old.borrow().clone()
    }

    #[must_use]
    pub fn expr(&self) -> &str {
        &self.inner.expr
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.inner.id)
            .field("expr", &self.inner.expr)
            .field("value", &*self.inner.old.borrow())
            .finish()
    }
}
