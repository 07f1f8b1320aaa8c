#![forbid(unsafe_code)]

//! Per-property subscriber lists.
//!
//! Every reactive property owns exactly one [`Dep`] for its whole lifetime.
//! Reads performed while a subscriber is active register that subscriber;
//! writes that change the value call [`Dep::notify`].
//!
//! # Invariants
//!
//! 1. Subscribers are updated in subscription order.
//! 2. Re-subscribing an already present subscriber is a no-op, so a write
//!    updates each subscriber at most once.
//! 3. Subscribers are held weakly; dropped ones are pruned on the next
//!    subscription or notification, so a read-only property does not
//!    accumulate dead entries.
//! 4. `notify` works on a snapshot, so subscribers may re-register (or new
//!    ones may subscribe) while the fan-out is running.
//!
//! # Failure Modes
//!
//! - Subscriber update fails: the remaining subscribers are still updated
//!   and the first error is returned to the writer.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ReactiveError;

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Something a [`Dep`] can notify.
pub trait Subscriber: 'static {
    /// Stable identity used for idempotent subscription.
    fn id(&self) -> SubscriberId;

    /// Re-evaluate after a dependency changed.
    fn update(self: Rc<Self>) -> Result<(), ReactiveError>;
}

/// Subscriber list for one reactive property.
#[derive(Default)]
pub struct Dep {
    subscribers: RefCell<Vec<(SubscriberId, Weak<dyn Subscriber>)>>,
}

impl Dep {
    /// Create an empty dependency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber`. Already present subscribers are not appended again.
    pub fn add_subscriber(&self, subscriber: &Rc<dyn Subscriber>) {
        let id = subscriber.id();
        let mut subs = self.subscribers.borrow_mut();
        subs.retain(|(_, weak)| weak.strong_count() > 0);
        if subs.iter().any(|(existing, _)| *existing == id) {
            return;
        }
        subs.push((id, Rc::downgrade(subscriber)));
    }

    /// Update every live subscriber in subscription order.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by a subscriber, after all
    /// subscribers have been updated.
    pub fn notify(&self) -> Result<(), ReactiveError> {
        let live: Vec<Rc<dyn Subscriber>> = {
            let mut subs = self.subscribers.borrow_mut();
            subs.retain(|(_, weak)| weak.strong_count() > 0);
            subs.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };

        tracing::trace!(message = "dep.notify", subscribers = live.len());

        let mut first_error = None;
        for subscriber in live {
            if let Err(err) = subscriber.update() {
                tracing::debug!(message = "dep.notify.failed", error = %err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Probe {
        id: SubscriberId,
        hits: Rc<Cell<u32>>,
        fail: bool,
    }

    impl Subscriber for Probe {
        fn id(&self) -> SubscriberId {
            self.id
        }

        fn update(self: Rc<Self>) -> Result<(), ReactiveError> {
            self.hits.set(self.hits.get() + 1);
            if self.fail {
                Err(ReactiveError::EmptyExpression)
            } else {
                Ok(())
            }
        }
    }

    fn probe(hits: &Rc<Cell<u32>>, fail: bool) -> Rc<dyn Subscriber> {
        Rc::new(Probe {
            id: SubscriberId::next(),
            hits: Rc::clone(hits),
            fail,
        })
    }

    #[test]
    fn notify_reaches_every_subscriber() {
        let dep = Dep::new();
        let hits = Rc::new(Cell::new(0));
        let a = probe(&hits, false);
        let b = probe(&hits, false);
        dep.add_subscriber(&a);
        dep.add_subscriber(&b);

        dep.notify().unwrap();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn resubscribe_is_idempotent() {
        let dep = Dep::new();
        let hits = Rc::new(Cell::new(0));
        let a = probe(&hits, false);
        dep.add_subscriber(&a);
        dep.add_subscriber(&a);
        dep.add_subscriber(&a);
        assert_eq!(dep.subscriber_count(), 1);

        dep.notify().unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let dep = Dep::new();
        let hits = Rc::new(Cell::new(0));
        let a = probe(&hits, false);
        {
            let b = probe(&hits, false);
            dep.add_subscriber(&b);
        }
        dep.add_subscriber(&a);
        assert_eq!(dep.subscriber_count(), 1);

        dep.notify().unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn subscribe_cycles_keep_storage_bounded() {
        let dep = Dep::new();
        let hits = Rc::new(Cell::new(0));
        let keeper = probe(&hits, false);
        dep.add_subscriber(&keeper);
        for _ in 0..1_000 {
            let transient = probe(&hits, false);
            dep.add_subscriber(&transient);
        }
        assert_eq!(dep.subscribers.borrow().len(), 2);
        assert_eq!(dep.subscriber_count(), 1);
    }

    #[test]
    fn failure_does_not_stop_fan_out() {
        let dep = Dep::new();
        let hits = Rc::new(Cell::new(0));
        let failing = probe(&hits, true);
        let ok = probe(&hits, false);
        dep.add_subscriber(&failing);
        dep.add_subscriber(&ok);

        let err = dep.notify().unwrap_err();
        assert!(matches!(err, ReactiveError::EmptyExpression));
        assert_eq!(hits.get(), 2, "second subscriber still updated");
    }

    #[test]
    fn subscriber_ids_are_unique() {
        let a = SubscriberId::next();
        let b = SubscriberId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }
}
