#![forbid(unsafe_code)]

//! Property boxes holding a single value.
//!
//! [`Property<V>`] is the plain box: read it with [`Pull`], write it with
//! [`Put`]. [`ReactiveProperty<V>`] additionally pushes every stored value to
//! its listeners.
//!
//! Cloning either type creates a new handle to the **same** value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::capability::{Access, Pull, Push, Put};
use crate::listener::{Listener, ListenerSet, Subscription};

/// Settable single-value box.
pub struct Property<V> {
    value: Rc<RefCell<Option<V>>>,
}

impl<V> Clone for Property<V> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
        }
    }
}

impl<V> Default for Property<V> {
    fn default() -> Self {
        Self {
            value: Rc::new(RefCell::new(None)),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Property<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.value.borrow())
            .finish()
    }
}

impl<V> Property<V> {
    /// Create a property holding `initial`.
    #[must_use]
    pub fn new(initial: impl Into<Option<V>>) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial.into())),
        }
    }

    /// Create a property holding nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the stored value.
    pub fn set(&self, value: impl Into<Option<V>>) {
        *self.value.borrow_mut() = value.into();
    }

    /// Remove the stored value.
    pub fn clear(&self) {
        self.value.borrow_mut().take();
    }

    /// Access the stored value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(Option<&V>) -> R) -> R {
        f(self.value.borrow().as_ref())
    }
}

impl<V: Clone> Pull<V> for Property<V> {
    fn get(&self) -> Option<V> {
        self.value.borrow().clone()
    }
}

impl<V> Put<V> for Property<V> {
    fn put(&self, value: Option<V>) {
        self.set(value);
    }
}

impl<V: Clone + 'static> Access<V> for Property<V> {
    fn pull_access(self: Rc<Self>) -> Option<Rc<dyn Pull<V>>> {
        Some(self)
    }
}

/// Property that notifies listeners whenever a value is stored.
///
/// Every `set` notifies, including one storing a value equal to the current
/// one: deciding whether a value changed is left to consumers.
pub struct ReactiveProperty<V> {
    property: Property<V>,
    listeners: Rc<ListenerSet<V>>,
}

impl<V> Clone for ReactiveProperty<V> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for ReactiveProperty<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveProperty")
            .field("value", &self.property.value.borrow())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl<V: 'static> ReactiveProperty<V> {
    /// Create a reactive property holding `initial`.
    #[must_use]
    pub fn new(initial: impl Into<Option<V>>) -> Self {
        Self {
            property: Property::new(initial),
            listeners: Rc::new(ListenerSet::new()),
        }
    }

    /// Store `value`, then notify every listener with it.
    ///
    /// # Panics
    ///
    /// Panics if a listener calls `set` on the same property (re-entrant
    /// borrow). Reading it back from a listener is fine.
    pub fn set(&self, value: impl Into<Option<V>>) {
        self.property.set(value);
        self.property.with(|v| self.listeners.notify(v));
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Access the stored value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(Option<&V>) -> R) -> R {
        self.property.with(f)
    }
}

impl<V: Clone> Pull<V> for ReactiveProperty<V> {
    fn get(&self) -> Option<V> {
        self.property.get()
    }
}

impl<V: 'static> Push<V> for ReactiveProperty<V> {
    fn subscribe(&self, listener: Listener<V>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

impl<V: 'static> Put<V> for ReactiveProperty<V> {
    fn put(&self, value: Option<V>) {
        self.set(value);
    }
}

impl<V: Clone + 'static> Access<V> for ReactiveProperty<V> {
    fn pull_access(self: Rc<Self>) -> Option<Rc<dyn Pull<V>>> {
        Some(self)
    }

    fn push_access(self: Rc<Self>) -> Option<Rc<dyn Push<V>>> {
        Some(self)
    }
}
