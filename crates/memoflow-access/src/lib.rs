#![forbid(unsafe_code)]

//! Access: capability contracts, listener sets, and single-value boxes.
//!
//! This crate describes *how* a value can be reached rather than what it is.
//! See [`capability`] for the contracts; the remaining modules are small
//! implementations used as inputs of memoized computations.

pub mod capability;
pub mod flow;
pub mod listener;
pub mod property;
pub mod storage;
pub mod value;

pub use capability::{Access, Generate, Pull, Push, Put};
pub use flow::{
    CheckableFlowController, FlowController, Generator, Puller, Pusher, ReadableFlowController, Sink,
};
pub use listener::{Listener, ListenerSet, Subscription};
pub use property::{Property, ReactiveProperty};
pub use storage::{EntryChange, Storage};
pub use value::Value;
