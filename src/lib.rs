//! A growable array that never leaves itself half-modified.
//!
//! # Purpose
//! This crate is a study of one data structure: a contiguous, growable collection,
//! [`DynamicArray`](collections::contiguous::DynamicArray), which manages its own buffer and keeps
//! a strong guarantee about failure. If any step of a mutation fails, whether that is allocating
//! the new buffer or copying one of the elements into it, the collection is left exactly as it was
//! before the call and nothing is leaked.
//!
//! # Method
//! Rather than moving elements around in place, every operation that needs to move elements builds
//! a complete replacement buffer from copies, and only swaps it in once the copies have all
//! succeeded. The buffer under construction is owned by a local guard, so any failure (or panic)
//! simply drops the guard and releases everything it holds. This trades speed for a very simple
//! argument about correctness, which is the point.
//!
//! Copies are made through [`TryClone`](collections::traits::TryClone), so that an element type can
//! report a failed copy as an error instead of panicking.
//!
//! # Error Handling
//! All errors are returned as [`Result`]s, in a strongly typed manner, using enums for static
//! dispatch with small structs that implement [`Error`](std::error::Error). Conditions that are
//! usually treated as programmer errors, like an out of bounds index, are reported the same way.
//! There are two exceptions. The [`Index`](std::ops::Index) operator has to return a reference
//! and therefore panics, and [`Clone`] has no way to report an error, so it panics if the new
//! buffer can't be allocated.
//!
//! Unlike the standard collections, allocation failure is returned to the caller rather than
//! aborting the process.
//!
//! # Logging
//! Buffer rebuilds and rolled back mutations are reported through [`tracing`] at the `trace` and
//! `debug` levels. Nothing is logged unless the application installs a subscriber.
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_const_for_fn)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

#[cfg(feature = "collections")]
pub mod collections;

pub(crate) mod util;

pub use util::error;
