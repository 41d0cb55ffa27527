//! Traits shared between collection types.
//!
//! At the moment this is only [`TryClone`], which collections use to copy elements in a way that
//! is allowed to fail without taking the collection down with it.

mod try_clone;

pub use try_clone::*;
