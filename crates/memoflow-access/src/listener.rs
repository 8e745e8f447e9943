#![forbid(unsafe_code)]

//! Listener registries for push-capable sources.
//!
//! # Design
//!
//! [`ListenerSet<V>`] keeps its callbacks as `Weak` pointers. The strong
//! reference lives in the [`Subscription`] returned by
//! [`subscribe()`](ListenerSet::subscribe), so the subscription owns the
//! listener: dropping it is the only way to unregister, and there is no global
//! registry to clean up.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order.
//! 2. A dropped [`Subscription`] is never called again.
//! 3. Dead entries are pruned lazily, on the next notification or count.
//! 4. A listener may subscribe new listeners while being notified; those are
//!    only called from the next notification on.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

/// Callback invoked with each pushed value.
pub type Listener<V> = Box<dyn Fn(Option<&V>)>;

type SharedListener<V> = Rc<dyn Fn(Option<&V>)>;

/// RAII guard keeping a listener registered.
///
/// Dropping the guard unregisters the listener before the next notification.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct Subscription {
    _listener: Box<dyn Any>,
}

impl Subscription {
    fn new<V: 'static>(listener: SharedListener<V>) -> Self {
        Self {
            _listener: Box::new(listener),
        }
    }

    /// Unregister the listener now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Ordered set of weakly held listeners.
pub struct ListenerSet<V> {
    listeners: RefCell<Vec<Weak<dyn Fn(Option<&V>)>>>,
}

impl<V> Default for ListenerSet<V> {
    fn default() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<V> fmt::Debug for ListenerSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("registered", &self.listeners.borrow().len())
            .finish()
    }
}

impl<V: 'static> ListenerSet<V> {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` until the returned guard is dropped.
    pub fn subscribe(&self, listener: Listener<V>) -> Subscription {
        let listener: SharedListener<V> = Rc::from(listener);
        self.listeners.borrow_mut().push(Rc::downgrade(&listener));
        Subscription::new(listener)
    }

    /// Call every live listener with `value`.
    pub fn notify(&self, value: Option<&V>) {
        // Upgrade first and release the borrow, so listeners may subscribe.
        let live: Vec<SharedListener<V>> = {
            let mut listeners = self.listeners.borrow_mut();
            Self::prune(&mut listeners);
            listeners.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in &live {
            listener(value);
        }
    }

    /// Number of live listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut listeners = self.listeners.borrow_mut();
        Self::prune(&mut listeners);
        listeners.len()
    }

    /// Whether no live listener remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(listeners: &mut Vec<Weak<dyn Fn(Option<&V>)>>) {
        let before = listeners.len();
        listeners.retain(|listener| listener.strong_count() > 0);
        let pruned = before - listeners.len();
        if pruned > 0 {
            trace!(pruned, remaining = listeners.len(), "listeners.prune");
        }
    }
}
