#![forbid(unsafe_code)]

//! The active-subscriber slot.
//!
//! Property reads consult [`active`] to learn which subscriber is currently
//! evaluating; that subscriber is then recorded in the property's
//! [`Dep`](crate::Dep). The slot is a thread-local stack: [`track`] pushes and
//! the returned guard pops on drop, so nested evaluations (a watcher built
//! while another one is evaluating) each register only themselves.
//!
//! # Invariants
//!
//! 1. The top of the stack is the only subscriber that reads register.
//! 2. The guard pops exactly the entry it pushed, including on early return
//!    or unwinding.
//! 3. Outside of an evaluation the stack is empty.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dep::Subscriber;

thread_local! {
    static ACTIVE: RefCell<Vec<Rc<dyn Subscriber>>> = const { RefCell::new(Vec::new()) };
}

/// Make `subscriber` the active one until the guard is dropped.
#[must_use = "dropping this guard ends dependency tracking"]
pub fn track(subscriber: Rc<dyn Subscriber>) -> TrackingGuard {
    let id = subscriber.id();
    ACTIVE.with(|stack| stack.borrow_mut().push(subscriber));
    TrackingGuard { id }
}

/// The subscriber currently evaluating, if any.
#[must_use]
pub fn active() -> Option<Rc<dyn Subscriber>> {
    ACTIVE.with(|stack| stack.borrow().last().cloned())
}

/// Number of evaluations in flight on this thread.
#[must_use]
pub fn depth() -> usize {
    ACTIVE.with(|stack| stack.borrow().len())
}

/// RAII guard returned by [`track`].
#[must_use = "dropping this guard ends dependency tracking"]
pub struct TrackingGuard {
    id: crate::dep::SubscriberId,
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        let popped = ACTIVE.with(|stack| stack.borrow_mut().pop());
        if let Some(popped) = popped {
            debug_assert_eq!(popped.id(), self.id);
        }
    }
}

impl std::fmt::Debug for TrackingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingGuard").field("id", &self.id).finish()
    }
}
