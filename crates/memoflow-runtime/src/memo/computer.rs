#![forbid(unsafe_code)]

//! Output functions and their value equality.
//!
//! A [`MemoCell`](super::MemoCell) decides whether its function changed by
//! comparing function *values*, not identities. [`Computer`] is the user
//! facing trait; any `Computer` that is also `PartialEq + 'static`
//! automatically becomes a [`DynComputer`], the object-safe form the cell
//! stores. Equality across erased types goes through a checked
//! `Any::downcast_ref`: two computers of different concrete types are never
//! equal.
//!
//! Closures have no equality of their own. [`FnComputer`] wraps one behind an
//! `Rc`, and its clones compare equal to each other.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

/// Input values handed to an output function, keyed like their sources.
///
/// Keys whose source yielded no value are absent.
pub type Snapshot<K, V> = AHashMap<K, V>;

/// Deterministic function from a snapshot of inputs to an output.
///
/// The result must depend only on `inputs`: the cell skips calls whenever the
/// inputs look unchanged.
pub trait Computer<K, V, O> {
    fn compute(&self, inputs: &Snapshot<K, V>) -> O;
}

/// Object-safe, comparable form of a [`Computer`].
pub trait DynComputer<K, V, O> {
    /// Run the wrapped computer.
    fn compute_dyn(&self, inputs: &Snapshot<K, V>) -> O;

    fn as_any(&self) -> &dyn Any;

    /// Value equality with another erased computer.
    fn same_as(&self, other: &dyn DynComputer<K, V, O>) -> bool;
}

impl<K, V, O, C> DynComputer<K, V, O> for C
where
    C: Computer<K, V, O> + PartialEq + 'static,
{
    fn compute_dyn(&self, inputs: &Snapshot<K, V>) -> O {
        self.compute(inputs)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn same_as(&self, other: &dyn DynComputer<K, V, O>) -> bool {
        other
            .as_any()
            .downcast_ref::<C>()
            .is_some_and(|other| self == other)
    }
}

/// Computer backed by a closure; clones share the closure and compare equal.
pub struct FnComputer<F> {
    f: Rc<F>,
}

impl<F> FnComputer<F> {
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f: Rc::new(f) }
    }
}

impl<F> Clone for FnComputer<F> {
    fn clone(&self) -> Self {
        Self {
            f: Rc::clone(&self.f),
        }
    }
}

impl<F> PartialEq for FnComputer<F> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

impl<F> fmt::Debug for FnComputer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComputer")
            .field("ptr", &Rc::as_ptr(&self.f))
            .finish()
    }
}

impl<K, V, O, F> Computer<K, V, O> for FnComputer<F>
where
    F: Fn(&Snapshot<K, V>) -> O,
{
    fn compute(&self, inputs: &Snapshot<K, V>) -> O {
        (self.f)(inputs)
    }
}
