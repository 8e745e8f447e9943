#![forbid(unsafe_code)]

//! Capability contracts for reading and writing a single value.
//!
//! A source of data is described by what it lets a consumer do:
//!
//! | Capability | Direction | Who initiates |
//! |---|---|---|
//! | [`Pull`] | read | the consumer asks for the current value |
//! | [`Push`] | read | the producer notifies subscribed listeners |
//! | [`Generate`] | write side | the consumer asks for a fresh value, possibly with side effects |
//! | [`Put`] | write | the caller stores a value |
//!
//! Every contract uses `Option<V>` for values: `None` is the absent value.
//!
//! [`Access`] is the umbrella trait used when a provider is handed over
//! without knowing statically which capabilities it carries. Each accessor
//! returns the provider viewed through one capability, or `None`.

use std::rc::Rc;

use crate::listener::{Listener, Subscription};

/// On-demand retrieval of a current value.
///
/// Implementations must be cheap and infallible. A source that can fail
/// represents the failure inside `V`.
pub trait Pull<V> {
    /// Current value, `None` when absent.
    fn get(&self) -> Option<V>;
}

/// Producer-initiated delivery of values to registered listeners.
pub trait Push<V> {
    /// Register a listener called synchronously for every produced value.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    fn subscribe(&self, listener: Listener<V>) -> Subscription;
}

/// Production of a fresh value on request.
///
/// Unlike [`Pull`], each call may have side effects (a counter advancing, a
/// queue being drained).
pub trait Generate<V> {
    /// Produce a value, `None` when absent.
    fn generate(&self) -> Option<V>;
}

/// Caller-initiated storage of a value.
pub trait Put<V> {
    /// Store `value`, replacing the previous one.
    fn put(&self, value: Option<V>);
}

/// Runtime view of the capabilities a provider exposes.
///
/// All accessors default to `None`, so an implementation only overrides the
/// capabilities it actually has.
pub trait Access<V> {
    /// The provider as a [`Pull`] source.
    fn pull_access(self: Rc<Self>) -> Option<Rc<dyn Pull<V>>> {
        None
    }

    /// The provider as a [`Push`] source.
    fn push_access(self: Rc<Self>) -> Option<Rc<dyn Push<V>>> {
        None
    }

    /// The provider as a [`Generate`] source.
    fn generate_access(self: Rc<Self>) -> Option<Rc<dyn Generate<V>>> {
        None
    }
}

impl<V, F> Pull<V> for F
where
    F: Fn() -> Option<V>,
{
    fn get(&self) -> Option<V> {
        self()
    }
}
