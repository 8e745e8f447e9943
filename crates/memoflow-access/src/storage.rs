#![forbid(unsafe_code)]

//! Keyed storage with entry notifications.
//!
//! # Design
//!
//! [`Storage<K, V>`] maps keys to values. An unknown key and a key holding no
//! value are the same thing: storing `None` removes the entry. Every write
//! notifies subscribers with an [`EntryChange`] carrying the old and new
//! value, even when both are equal or both absent.
//!
//! Listeners live in a [`ListenerSet`], so they are held through the returned
//! [`Subscription`] and called in subscription order.
//!
//! # Invariants
//!
//! 1. No entry ever holds an absent value.
//! 2. One write, one notification. Bulk operations notify once per key, in
//!    iteration order.
//! 3. Listeners run after the map is updated and unborrowed, so they may
//!    read or write the storage.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;
use tracing::trace;

use crate::listener::{ListenerSet, Subscription};

/// One write to a [`Storage`].
#[derive(Debug, Clone, PartialEq)]
pub struct EntryChange<K, V> {
    pub key: K,
    /// `None` when the key was added.
    pub old: Option<V>,
    /// `None` when the key was removed.
    pub new: Option<V>,
}

/// Mutable key-value storage notifying listeners of each write.
///
/// Cloning a `Storage` creates a new handle to the **same** entries.
pub struct Storage<K, V> {
    entries: Rc<RefCell<AHashMap<K, V>>>,
    listeners: Rc<ListenerSet<EntryChange<K, V>>>,
}

impl<K, V> Clone for Storage<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Storage<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("entries", &self.entries.borrow())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl<K, V> Default for Storage<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Storage<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(AHashMap::new())),
            listeners: Rc::new(ListenerSet::new()),
        }
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.borrow().get(key).cloned()
    }

    /// Values stored under `keys`, position for position.
    #[must_use]
    pub fn get_all<'a, I>(&self, keys: I) -> Vec<Option<V>>
    where
        I: IntoIterator<Item = &'a K>,
    {
        let entries = self.entries.borrow();
        keys.into_iter().map(|key| entries.get(key).cloned()).collect()
    }

    /// Store `value` under `key`; `None` removes the entry.
    pub fn set(&self, key: K, value: impl Into<Option<V>>) {
        let new = value.into();
        let old = {
            let mut entries = self.entries.borrow_mut();
            match &new {
                Some(value) => entries.insert(key.clone(), value.clone()),
                None => entries.remove(&key),
            }
        };
        trace!(key = ?key, added = old.is_none(), removed = new.is_none(), "storage.set");
        self.listeners.notify(Some(&EntryChange { key, old, new }));
    }

    /// Same as `set(key, None)`.
    pub fn remove(&self, key: K) {
        self.set(key, None);
    }

    /// [`set()`](Self::set) each entry in order.
    pub fn set_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, Option<V>)>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    /// [`remove()`](Self::remove) each key in order.
    pub fn remove_all<I>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        for key in keys {
            self.remove(key);
        }
    }

    /// Remove every entry, notifying once per removed key.
    pub fn clear(&self) {
        self.remove_all(self.keys());
    }

    /// Snapshot of the stored keys.
    #[must_use]
    pub fn keys(&self) -> Vec<K> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Snapshot of the stored entries.
    #[must_use]
    pub fn entries(&self) -> Vec<(K, V)> {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.borrow().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Call `listener` after every write until the guard is dropped.
    pub fn subscribe(&self, listener: impl Fn(&EntryChange<K, V>) + 'static) -> Subscription {
        self.listeners.subscribe(Box::new(move |change: Option<&EntryChange<K, V>>| {
            if let Some(change) = change {
                listener(change);
            }
        }))
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
