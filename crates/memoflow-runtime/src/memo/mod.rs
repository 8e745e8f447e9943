#![forbid(unsafe_code)]

//! Memoized computations over keyed pull sources.
//!
//! - [`MemoCell`]: a cached output recomputed on query only when an input or
//!   the output function changed.
//! - [`Computer`]: the output function contract, compared by value.
//! - [`FnComputer`]: closure adapter whose clones compare equal.
//!
//! # Architecture
//!
//! `MemoCell<K, V, O>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership, like every handle in this workspace. It holds no subscription:
//! change detection compares pulled values against the snapshot recorded at
//! the previous computation.

pub mod cell;
pub mod computer;

pub use cell::MemoCell;
pub use computer::{Computer, DynComputer, FnComputer, Snapshot};
