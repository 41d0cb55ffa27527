//! Collection types and the traits they share.
//!
//! # Method
//! Collections here copy elements through [`TryClone`](traits::TryClone) whenever they rebuild
//! their storage, so that a failed copy can be reported and rolled back instead of leaving a
//! half-moved collection behind.

#[cfg(feature = "contiguous")]
pub mod contiguous;
#[cfg(feature = "traits")]
pub mod traits;
