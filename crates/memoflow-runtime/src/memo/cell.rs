#![forbid(unsafe_code)]

//! Memoized multi-input computation cell.
//!
//! # Design
//!
//! [`MemoCell<K, V, O>`] owns a [`SourceTable`] and an output function. It
//! does not subscribe to anything: on every [`query()`](MemoCell::query) it
//! pulls each source, compares the values against the snapshot recorded at the
//! previous query, and calls the function only if something differs. The
//! decision runs in a fixed order:
//!
//! 1. Never computed (or invalidated): recompute.
//! 2. Function not value-equal to the one that produced the cached output:
//!    recompute. The "last used" function is replaced by the current one
//!    either way, so equal-but-distinct function objects trigger only once.
//! 3. Any pulled value differs from its recorded value: recompute, and
//!    record the new value immediately.
//! 4. Otherwise, a recorded key whose source was unregistered: recompute.
//!
//! On recomputation the snapshot is pruned to the registered keys and handed
//! to the function.
//!
//! # Invariants
//!
//! 1. Two queries with no mutation in between call the function at most once.
//! 2. The snapshot never holds an absent value: a source yielding `None` is
//!    missing from the map the function receives. Removing a source whose
//!    last value was absent is therefore not a change.
//! 3. `version` increments by exactly 1 per call of the function.
//! 4. Changing a value and changing it back between two queries is not a
//!    change; neither is replacing a provider by one yielding an equal value.
//!
//! # Failure Modes
//!
//! - **No function set**: `query()` returns [`MemoError::NotConfigured`].
//! - **Output function panics**: the cached output is dropped before the
//!   call, so the next query recomputes even though the snapshot already
//!   holds the new inputs. [`cached()`](MemoCell::cached) yields `None` until
//!   a call succeeds.
//! - **Re-entrancy**: an output function that queries its own cell panics
//!   (re-entrant borrow). Sources are pulled before the cell is borrowed for
//!   update, so a source may inspect the cell it feeds.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::AHashMap;
use memoflow_access::{Access, Generate, Pull, Push};
use tracing::{debug, trace, warn};

use super::computer::{Computer, DynComputer, Snapshot};
use crate::error::{MemoError, Result};
use crate::sources::{Provider, SourceTable};

/// Label used in log events when none is configured.
pub const DEFAULT_LABEL: &str = "memo";

type SharedComputer<K, V, O> = Rc<dyn DynComputer<K, V, O>>;

/// Shared interior for [`MemoCell`].
struct MemoInner<K, V, O> {
    /// Name reported in log events.
    label: String,
    sources: SourceTable<K, V>,
    /// Function to use for the next computation.
    computer: Option<SharedComputer<K, V, O>>,
    /// Function that produced `cached`.
    last_computer: Option<SharedComputer<K, V, O>>,
    /// Inputs of the last computation; `None` means "compute on next query".
    last_inputs: Option<Snapshot<K, V>>,
    cached: Option<O>,
    version: u64,
}

/// Lazily recomputed output over a keyed set of pull sources.
///
/// Cloning a `MemoCell` creates a new handle to the **same** inner state.
pub struct MemoCell<K, V, O> {
    inner: Rc<RefCell<MemoInner<K, V, O>>>,
}

impl<K, V, O> Clone for MemoCell<K, V, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: fmt::Debug, V, O: fmt::Debug> fmt::Debug for MemoCell<K, V, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemoCell")
            .field("label", &inner.label)
            .field("sources", &inner.sources)
            .field("configured", &inner.computer.is_some())
            .field("cached", &inner.cached)
            .field("version", &inner.version)
            .finish()
    }
}

impl<K, V, O> Default for MemoCell<K, V, O>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
    O: Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, O> MemoCell<K, V, O>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
    O: Clone + 'static,
{
    /// Create a cell with no function and no sources.
    ///
    /// A function must be set before the first [`query()`](Self::query).
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(MemoInner {
                label: DEFAULT_LABEL.to_owned(),
                sources: SourceTable::new(),
                computer: None,
                last_computer: None,
                last_inputs: None,
                cached: None,
                version: 0,
            })),
        }
    }

    /// Create a cell computing with `computer`.
    #[must_use]
    pub fn with_function<C>(computer: C) -> Self
    where
        C: Computer<K, V, O> + PartialEq + 'static,
    {
        let cell = Self::new();
        cell.set_function(computer);
        cell
    }

    /// Create a cell computing with `computer` over `entries`.
    ///
    /// Fails like [`register_all()`](Self::register_all).
    pub fn with_sources<C, I>(computer: C, entries: I) -> Result<Self>
    where
        C: Computer<K, V, O> + PartialEq + 'static,
        I: IntoIterator<Item = (K, Rc<dyn Access<V>>)>,
    {
        let cell = Self::with_function(computer);
        cell.register_all(entries)?;
        Ok(cell)
    }

    /// Set the name reported in log events.
    #[must_use]
    pub fn label(self, label: impl Into<String>) -> Self {
        self.inner.borrow_mut().label = label.into();
        self
    }

    // ── Function ────────────────────────────────────────────────────────

    /// Replace the output function.
    ///
    /// Nothing is computed now. The next query recomputes unless `computer`
    /// equals the function that produced the cached output.
    pub fn set_function<C>(&self, computer: C)
    where
        C: Computer<K, V, O> + PartialEq + 'static,
    {
        self.inner.borrow_mut().computer = Some(Rc::new(computer));
    }

    /// The configured function, which may differ from the one that produced
    /// the cached output.
    #[must_use]
    pub fn current_function(&self) -> Option<Rc<dyn DynComputer<K, V, O>>> {
        self.inner.borrow().computer.clone()
    }

    /// Whether the configured function equals `computer`.
    #[must_use]
    pub fn function_is<C: PartialEq + 'static>(&self, computer: &C) -> bool {
        self.inner
            .borrow()
            .computer
            .as_ref()
            .and_then(|current| current.as_any().downcast_ref::<C>())
            .is_some_and(|current| current == computer)
    }

    // ── Sources ─────────────────────────────────────────────────────────

    /// See [`SourceTable::register`].
    pub fn register(&self, key: K, provider: Provider<V>) {
        self.inner.borrow_mut().sources.register(key, provider);
    }

    /// See [`SourceTable::register_push`].
    pub fn register_push<P>(&self, key: K, source: &P, default: Option<V>) -> Provider<V>
    where
        P: Push<V> + ?Sized,
    {
        self.inner
            .borrow_mut()
            .sources
            .register_push(key, source, default)
    }

    /// See [`SourceTable::register_generator`].
    pub fn register_generator(&self, key: K, source: Rc<dyn Generate<V>>) -> Provider<V> {
        self.inner
            .borrow_mut()
            .sources
            .register_generator(key, source)
    }

    /// See [`SourceTable::register_all`].
    pub fn register_all<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Rc<dyn Access<V>>)>,
    {
        self.inner.borrow_mut().sources.register_all(entries)
    }

    /// See [`SourceTable::replace_all`].
    pub fn replace_all<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Rc<dyn Access<V>>)>,
    {
        self.inner.borrow_mut().sources.replace_all(entries)
    }

    /// Provider registered under `key`, wrapped if it was not pull-capable.
    #[must_use]
    pub fn source<Q>(&self, key: &Q) -> Option<Provider<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.borrow().sources.get(key).cloned()
    }

    /// Remove the source under `key`. Unknown keys are ignored.
    pub fn unregister<Q>(&self, key: &Q)
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + fmt::Debug + ?Sized,
    {
        self.inner.borrow_mut().sources.unregister(key);
    }

    /// Every registered source.
    #[must_use]
    pub fn sources(&self) -> AHashMap<K, Provider<V>> {
        self.inner.borrow().sources.all().clone()
    }

    // ── Output ──────────────────────────────────────────────────────────

    /// Current output, recomputed only if an input or the function changed.
    ///
    /// # Panics
    ///
    /// Panics if the output function queries this same cell.
    pub fn query(&self) -> Result<O> {
        let (computer, providers) = {
            let inner = self.inner.borrow();
            let computer = inner.computer.clone().ok_or(MemoError::NotConfigured)?;
            let providers: Vec<(K, Provider<V>)> = inner
                .sources
                .all()
                .iter()
                .map(|(key, provider)| (key.clone(), Rc::clone(provider)))
                .collect();
            (computer, providers)
        };
        let pulled: Vec<(K, Option<V>)> = providers
            .into_iter()
            .map(|(key, provider)| {
                let value = provider.get();
                (key, value)
            })
            .collect();

        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;
        let mut recompute = false;

        if inner.last_inputs.is_none() || inner.cached.is_none() {
            debug!(label = %inner.label, "memo.first");
            recompute = true;
        }
        let last_inputs = inner.last_inputs.get_or_insert_with(Snapshot::default);

        let same_function = inner
            .last_computer
            .as_ref()
            .is_some_and(|last| last.same_as(computer.as_ref()));
        if !same_function {
            debug!(label = %inner.label, "memo.function_changed");
            recompute = true;
        }
        inner.last_computer = Some(Rc::clone(&computer));

        for (key, value) in pulled {
            let last = last_inputs.get(&key);
            if last == value.as_ref() {
                trace!(label = %inner.label, key = ?key, "memo.input_unchanged");
                continue;
            }
            debug!(
                label = %inner.label,
                key = ?key,
                old = ?last,
                new = ?value,
                "memo.input_changed"
            );
            match value {
                Some(value) => {
                    last_inputs.insert(key, value);
                }
                None => {
                    last_inputs.remove(&key);
                }
            }
            recompute = true;
        }

        if !recompute {
            // Absent values are never recorded, so every stale key held one.
            let removed = last_inputs
                .keys()
                .filter(|key| !inner.sources.contains(*key))
                .count();
            if removed > 0 {
                debug!(label = %inner.label, removed, "memo.inputs_removed");
                recompute = true;
            }
        }

        if !recompute {
            if let Some(cached) = &inner.cached {
                trace!(label = %inner.label, version = inner.version, "memo.cached");
                return Ok(cached.clone());
            }
        }

        last_inputs.retain(|key, _| inner.sources.contains(key));
        inner.cached = None;
        let output = computer.compute_dyn(last_inputs);
        inner.version += 1;
        inner.cached = Some(output.clone());
        debug!(
            label = %inner.label,
            inputs = last_inputs.len(),
            version = inner.version,
            "memo.recompute"
        );
        Ok(output)
    }

    /// Last computed output, without checking the inputs.
    #[must_use]
    pub fn cached(&self) -> Option<O> {
        self.inner.borrow().cached.clone()
    }

    /// Number of times the output function has run.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Whether a snapshot is recorded, i.e. the next query may reuse the
    /// cached output.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.inner.borrow().last_inputs.is_some()
    }

    /// Forget the recorded inputs so the next query recomputes.
    pub fn invalidate(&self) {
        self.inner.borrow_mut().last_inputs = None;
    }
}

impl<K, V, O> Pull<O> for MemoCell<K, V, O>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
    O: Clone + 'static,
{
    /// Query the cell; an unconfigured cell yields no value.
    fn get(&self) -> Option<O> {
        match self.query() {
            Ok(output) => Some(output),
            Err(err) => {
                warn!(label = %self.inner.borrow().label, error = %err, "memo.pull_failed");
                None
            }
        }
    }
}

impl<K, V, O> Access<O> for MemoCell<K, V, O>
where
    K: Eq + Hash + Clone + fmt::Debug + 'static,
    V: Clone + PartialEq + fmt::Debug + 'static,
    O: Clone + 'static,
{
    fn pull_access(self: Rc<Self>) -> Option<Rc<dyn Pull<O>>> {
        Some(self)
    }
}
