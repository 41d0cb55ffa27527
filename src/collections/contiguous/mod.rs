//! Contiguous collection types. Namely [`DynamicArray`], backed by a single exclusively owned
//! buffer that is rebuilt, rather than shuffled in place, whenever elements move.
#![warn(missing_docs)]

pub mod dynamic_array;
pub(crate) mod slots;

#[doc(inline)]
pub use dynamic_array::DynamicArray;
