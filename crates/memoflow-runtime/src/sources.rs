#![forbid(unsafe_code)]

//! Keyed table of pull-capable input providers.
//!
//! # Design
//!
//! [`SourceTable<K, V>`] stores one [`Pull`] provider per key. Providers that
//! only push ([`Push`]) or only generate ([`Generate`]) are wrapped on the way
//! in, so every stored entry answers "what is your value now?":
//!
//! - [`LastPushed`] remembers the most recent pushed value, seeded with a
//!   default.
//! - [`Generated`] calls the generator on every pull.
//!
//! Registration never reads a value. Values are only pulled when a consumer
//! such as [`MemoCell`](crate::memo::MemoCell) asks for them.
//!
//! # Invariants
//!
//! 1. At most one provider per key; registering again replaces it.
//! 2. [`get()`](SourceTable::get) returns the stored wrapper, never the
//!    push or generate object it wraps.
//! 3. Bulk registration is not transactional: entries before a failing one
//!    stay registered.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;
use memoflow_access::{Access, Generate, Pull, Push, Subscription};
use tracing::debug;

use crate::error::{MemoError, Result};

/// Shared handle to a pull-capable provider.
pub type Provider<V> = Rc<dyn Pull<V>>;

/// Pull view of a push-only source: returns the last pushed value.
///
/// Holds exactly one subscription on the wrapped source for its whole
/// lifetime.
pub struct LastPushed<V> {
    last: Rc<RefCell<Option<V>>>,
    _subscription: Subscription,
}

impl<V: Clone + 'static> LastPushed<V> {
    /// Subscribe to `source`, answering `default` until something is pushed.
    pub fn new<P>(source: &P, default: Option<V>) -> Self
    where
        P: Push<V> + ?Sized,
    {
        let last = Rc::new(RefCell::new(default));
        let sink = Rc::clone(&last);
        let subscription = source.subscribe(Box::new(move |value: Option<&V>| {
            *sink.borrow_mut() = value.cloned();
        }));
        Self {
            last,
            _subscription: subscription,
        }
    }
}

impl<V: Clone> Pull<V> for LastPushed<V> {
    fn get(&self) -> Option<V> {
        self.last.borrow().clone()
    }
}

impl<V: fmt::Debug> fmt::Debug for LastPushed<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LastPushed")
            .field("last", &self.last.borrow())
            .finish_non_exhaustive()
    }
}

/// Pull view of a generator: every pull generates.
pub struct Generated<V> {
    source: Rc<dyn Generate<V>>,
}

impl<V> Generated<V> {
    #[must_use]
    pub fn new(source: Rc<dyn Generate<V>>) -> Self {
        Self { source }
    }
}

impl<V> Pull<V> for Generated<V> {
    fn get(&self) -> Option<V> {
        self.source.generate()
    }
}

impl<V> fmt::Debug for Generated<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generated").finish_non_exhaustive()
    }
}

/// Mapping from key to pull-capable provider.
pub struct SourceTable<K, V> {
    sources: AHashMap<K, Provider<V>>,
}

impl<K, V> Default for SourceTable<K, V> {
    fn default() -> Self {
        Self {
            sources: AHashMap::new(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for SourceTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceTable")
            .field("keys", &self.sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K, V> SourceTable<K, V>
where
    K: Eq + Hash + fmt::Debug,
    V: Clone + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a pull-capable provider under `key`, replacing any previous one.
    pub fn register(&mut self, key: K, provider: Provider<V>) {
        debug!(key = ?key, kind = "pull", "sources.register");
        self.sources.insert(key, provider);
    }

    /// Wrap a push-only source in a [`LastPushed`] adapter and register it.
    ///
    /// Returns the adapter, which is also what [`get()`](Self::get) returns.
    pub fn register_push<P>(&mut self, key: K, source: &P, default: Option<V>) -> Provider<V>
    where
        P: Push<V> + ?Sized,
    {
        debug!(key = ?key, kind = "push", "sources.register");
        let wrapper: Provider<V> = Rc::new(LastPushed::new(source, default));
        self.sources.insert(key, Rc::clone(&wrapper));
        wrapper
    }

    /// Wrap a generator in a [`Generated`] adapter and register it.
    pub fn register_generator(&mut self, key: K, source: Rc<dyn Generate<V>>) -> Provider<V> {
        debug!(key = ?key, kind = "generate", "sources.register");
        let wrapper: Provider<V> = Rc::new(Generated::new(source));
        self.sources.insert(key, Rc::clone(&wrapper));
        wrapper
    }

    /// Register each entry through the first capability it exposes, in the
    /// order pull, push, generate.
    ///
    /// Push sources start out absent. Stops at the first entry exposing none
    /// of the three capabilities; earlier entries remain registered.
    pub fn register_all<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Rc<dyn Access<V>>)>,
    {
        for (key, entry) in entries {
            if let Some(pull) = Rc::clone(&entry).pull_access() {
                self.register(key, pull);
            } else if let Some(push) = Rc::clone(&entry).push_access() {
                self.register_push(key, push.as_ref(), None);
            } else if let Some(generate) = entry.generate_access() {
                self.register_generator(key, generate);
            } else {
                return Err(MemoError::unsupported(&key));
            }
        }
        Ok(())
    }

    /// Drop every entry, then [`register_all()`](Self::register_all).
    pub fn replace_all<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Rc<dyn Access<V>>)>,
    {
        self.clear();
        self.register_all(entries)
    }

    /// Provider registered under `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&Provider<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.sources.get(key)
    }

    /// Remove the entry under `key`, if any.
    pub fn unregister<Q>(&mut self, key: &Q) -> Option<Provider<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + fmt::Debug + ?Sized,
    {
        let removed = self.sources.remove(key);
        if removed.is_some() {
            debug!(key = ?key, "sources.unregister");
        }
        removed
    }

    /// Read-only view of every entry.
    #[must_use]
    pub fn all(&self) -> &AHashMap<K, Provider<V>> {
        &self.sources
    }

    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.sources.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.sources.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn clear(&mut self) {
        if !self.sources.is_empty() {
            debug!(removed = self.sources.len(), "sources.clear");
        }
        self.sources.clear();
    }
}
