//! A module containing [`DynamicArray`], a growable contiguous collection whose mutations either
//! complete fully or leave it untouched.
//!
//! [`DynamicArray`] is also re-exported under the parent module.

mod dynamic_array;
mod staging;
mod tests;

pub use dynamic_array::*;
