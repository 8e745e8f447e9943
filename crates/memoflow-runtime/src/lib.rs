#![forbid(unsafe_code)]

//! Runtime: source tables and memoized computation cells.

pub mod error;
pub mod memo;
pub mod sources;

pub use error::{MemoError, Result};
pub use memo::{Computer, DynComputer, FnComputer, MemoCell, Snapshot};
pub use sources::{Generated, LastPushed, Provider, SourceTable};
