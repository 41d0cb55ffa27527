//! Error types returned by the collections in this crate.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use derive_more::{Display, Error, From, IsVariant};

/// An index didn't refer to a valid position in a collection of `len` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutOfBounds {
    pub index: usize,
    pub len: usize,
}

impl Display for IndexOutOfBounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Index {} out of bounds for collection with {} elements!", self.index, self.len)
    }
}

impl Error for IndexOutOfBounds {}

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("Capacity overflow!")]
pub struct CapacityOverflow;

/// The global allocator returned null when asked for `cap` slots.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("allocation of {cap} slots failed")]
pub struct AllocError {
    #[error(not(source))]
    pub cap: usize,
}

/// Errors that can occur while obtaining a new backing buffer, before any element is touched.
#[derive(Debug, Display, Error, From, IsVariant, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    CapacityOverflow(CapacityOverflow),
    Alloc(AllocError),
}

/// The error returned by any mutating operation of a
/// [`DynamicArray`](crate::collections::contiguous::DynamicArray).
///
/// Whichever variant is returned, the collection that produced it is left exactly as it was before
/// the call.
#[derive(Debug, IsVariant, Clone, PartialEq, Eq)]
pub enum MutationError<E> {
    /// The provided index didn't refer to a valid position for the operation.
    IndexOutOfBounds(IndexOutOfBounds),
    /// The requested capacity can't be represented as a memory layout.
    CapacityOverflow(CapacityOverflow),
    /// The global allocator couldn't provide the replacement buffer.
    Alloc(AllocError),
    /// Copying one of the elements failed.
    Copy(E),
}

impl<E> MutationError<E> {
    /// Returns the copy error, if that is what caused this error.
    pub fn into_copy(self) -> Option<E> {
        match self {
            MutationError::Copy(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> From<IndexOutOfBounds> for MutationError<E> {
    fn from(value: IndexOutOfBounds) -> Self {
        MutationError::IndexOutOfBounds(value)
    }
}

impl<E> From<CapacityOverflow> for MutationError<E> {
    fn from(value: CapacityOverflow) -> Self {
        MutationError::CapacityOverflow(value)
    }
}

impl<E> From<AllocError> for MutationError<E> {
    fn from(value: AllocError) -> Self {
        MutationError::Alloc(value)
    }
}

impl<E> From<BufferError> for MutationError<E> {
    fn from(value: BufferError) -> Self {
        match value {
            BufferError::CapacityOverflow(e) => e.into(),
            BufferError::Alloc(e) => e.into(),
        }
    }
}

impl<E: Display> Display for MutationError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::IndexOutOfBounds(e) => write!(f, "{e}"),
            MutationError::CapacityOverflow(e) => write!(f, "{e}"),
            MutationError::Alloc(e) => write!(f, "{e}"),
            MutationError::Copy(e) => write!(f, "element copy failed: {e}"),
        }
    }
}

impl<E: Error + 'static> Error for MutationError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MutationError::IndexOutOfBounds(e) => Some(e),
            MutationError::CapacityOverflow(e) => Some(e),
            MutationError::Alloc(e) => Some(e),
            MutationError::Copy(e) => Some(e),
        }
    }
}
