#![forbid(unsafe_code)]

//! Lifetime management for groups of [`Watcher`]s.
//!
//! `Dep`s only hold watchers weakly, so something has to own them. A
//! [`BindingScope`] collects the watchers created for one view (typically
//! one template compile pass); dropping or clearing the scope disconnects
//! every binding in it.
//!
//! # Invariants
//!
//! 1. After `clear()` or drop, no callback of a held watcher fires again.
//! 2. `binding_count()` is the number of held watchers.

use crate::error::ReactiveError;
use crate::value::Value;
use crate::watcher::Watcher;

/// Owns the watchers of one logical view.
#[derive(Default)]
pub struct BindingScope {
    watchers: Vec<Watcher>,
}

impl BindingScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `watcher` alive until the scope is cleared or dropped.
    pub fn hold(&mut self, watcher: Watcher) {
        self.watchers.push(watcher);
    }

    /// Create a watcher and hold it.
    ///
    /// # Errors
    ///
    /// Any error from the watcher's initial evaluation.
    pub fn watch(
        &mut self,
        expr: &str,
        root: &Value,
        callback: impl Fn(&Value) -> Result<(), ReactiveError> + 'static,
    ) -> Result<&Watcher, ReactiveError> {
        let watcher = Watcher::new(expr, root.clone(), callback)?;
        self.watchers.push(watcher);
        Ok(&self.watchers[self.watchers.len() - 1])
    }

    /// Move every watcher of `other` into this scope.
    pub fn absorb(&mut self, other: BindingScope) {
        self.watchers.extend(other.watchers);
    }

    /// Watchers in creation order.
    #[must_use]
    pub fn watchers(&self) -> &[Watcher] {
        &self.watchers
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.watchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Release every watcher (the scope stays reusable).
    pub fn clear(&mut self) {
        self.watchers.clear();
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("binding_count", &self.watchers.len())
            .finish()
    }
}
