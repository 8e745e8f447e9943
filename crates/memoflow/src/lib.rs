#![forbid(unsafe_code)]

//! memoflow public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use memoflow_access as access;
#[cfg(feature = "runtime")]
pub use memoflow_runtime as runtime;

pub mod prelude {
    pub use memoflow_access::{
        Access, CheckableFlowController, EntryChange, FlowController, Generate, Generator, Property,
        Pull, Puller, Push, Pusher, Put, ReactiveProperty, ReadableFlowController, Sink, Storage,
        Subscription, Value,
    };
    #[cfg(feature = "runtime")]
    pub use memoflow_runtime::{
        Computer, FnComputer, MemoCell, MemoError, Provider, Snapshot, SourceTable,
    };
}
