#![forbid(unsafe_code)]

//! Reactive state engine for Weft.
//!
//! This crate provides the dependency-tracking core used by template bindings:
//!
//! - [`StateObserver`]: turns plain JSON data into a reactive [`Value`] tree
//!   where every key of every object is a reactive property.
//! - [`Dep`]: the subscriber list owned by each reactive property.
//! - [`Watcher`]: one expression bound to one change callback.
//! - [`tracking`]: the active-subscriber stack consulted by property reads.
//! - [`path`]: dotted-path evaluation and `{{ }}` interpolation.
//! - [`BindingScope`]: owns watchers so that bindings live as long as a view.
//!
//! # Architecture
//!
//! Objects use `Rc<RefCell<..>>` for single-threaded shared ownership. A
//! watcher evaluates its expression with itself on top of the tracking stack;
//! each property read along the way records it in that property's `Dep`. A
//! write that changes a property calls `Dep::notify`, which re-evaluates every
//! subscribed watcher synchronously, in subscription order, before the write
//! returns.
//!
//! # Invariants
//!
//! 1. Each property has exactly one `Dep` for its whole lifetime.
//! 2. Writing a value identical to the current one notifies nobody.
//! 3. The tracking stack is empty whenever no evaluation is running.
//! 4. A write updates each subscribed watcher at most once.

pub mod dep;
pub mod error;
pub mod observer;
pub mod path;
pub mod scope;
pub mod tracking;
pub mod value;
pub mod watcher;

pub use dep::{Dep, Subscriber, SubscriberId};
pub use error::ReactiveError;
pub use observer::StateObserver;
pub use scope::BindingScope;
pub use value::{Object, ObjectKind, Value};
pub use watcher::Watcher;
