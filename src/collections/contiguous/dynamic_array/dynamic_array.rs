use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::{Index, IndexMut};

use super::staging::Staging;
use crate::collections::contiguous::slots::Slots;
use crate::collections::traits::TryClone;
use crate::util::error::{BufferError, CapacityOverflow, IndexOutOfBounds, MutationError};
use crate::util::result::ResultExtension;

const GROWTH_FACTOR: usize = 2;
const GROWTH_OFFSET: usize = 1;

/// A growable contiguous collection with all-or-nothing mutation.
///
/// Every operation which moves elements around (`insert` and `erase` anywhere except the end)
/// builds a complete replacement buffer out of copies of the existing elements, and only swaps it
/// in once every copy has succeeded. Copies are made through [`TryClone`], so if one of them
/// fails, the partial replacement is released and the DynamicArray is left exactly as it was:
/// same length, same capacity, same elements. The same applies if a copy panics instead.
///
/// Unlike [`Vec`], out of bounds indices are reported as [`IndexOutOfBounds`] errors from every
/// method except the [`Index`] operator, which panics with the same message.
///
/// # Growth
/// When an element is inserted into a full DynamicArray, the capacity grows from `c` to
/// `2 * c + 1`, so pushing onto an empty DynamicArray repeatedly gives capacities of 1, 3, 7, 15...
/// The capacity is never reduced by removing elements.
///
/// # Time Complexity
/// For this analysis of time complexity, variables are defined as follows:
/// - `n`: The number of items in the DynamicArray.
///
/// | Method | Complexity |
/// |-|-|
/// | `at` | `O(1)` |
/// | `len` | `O(1)` |
/// | `push_back` | `O(n)` |
/// | `pop_back` | `O(1)` |
/// | `insert` | `O(n)` |
/// | `erase` | `O(n)`*, `O(1)` |
/// | `clear` | `O(n)` |
///
/// \* Erasing the last element is `O(1)`, because nothing needs to be copied.
pub struct DynamicArray<T> {
    pub(crate) slots: Slots<T>,
    pub(crate) len: usize,
}

impl<T> DynamicArray<T> {
    /// Creates a new DynamicArray with length and capacity 0. Memory will be allocated by the first
    /// insertion.
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let arr: DynamicArray<u8> = DynamicArray::new();
    /// assert_eq!(arr.len(), 0);
    /// assert_eq!(arr.cap(), 0);
    /// ```
    pub const fn new() -> DynamicArray<T> {
        DynamicArray {
            slots: Slots::dangling(),
            len: 0,
        }
    }

    /// Creates a new, empty DynamicArray with capacity exactly equal to `cap`.
    ///
    /// # Errors
    /// Returns a [`BufferError`] if the memory layout would exceed [`isize::MAX`] bytes or the
    /// allocation fails.
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let arr = DynamicArray::<u32>::with_cap(5).unwrap();
    /// assert_eq!(arr.cap(), 5);
    /// assert!(arr.is_empty());
    /// ```
    pub fn with_cap(cap: usize) -> Result<DynamicArray<T>, BufferError> {
        Ok(DynamicArray {
            slots: Slots::new_uninit(cap)?,
            len: 0,
        })
    }

    /// Returns the number of elements in the DynamicArray.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the DynamicArray contains no elements.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots that the DynamicArray can fill before it needs to grow.
    pub const fn cap(&self) -> usize {
        self.slots.cap()
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Errors
    /// Returns [`IndexOutOfBounds`] if `index >= len`.
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let arr = DynamicArray::from_slice(&[3, 2, 1]).unwrap();
    /// assert_eq!(arr.at(0), Ok(&3));
    /// assert!(arr.at(3).is_err());
    /// ```
    pub fn at(&self, index: usize) -> Result<&T, IndexOutOfBounds> {
        self.check_index(index)?;
        // SAFETY: index < len was just checked.
        Ok(unsafe { self.at_unchecked(index) })
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// # Errors
    /// Returns [`IndexOutOfBounds`] if `index >= len`.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, IndexOutOfBounds> {
        self.check_index(index)?;
        // SAFETY: index < len was just checked.
        Ok(unsafe { self.at_unchecked_mut(index) })
    }

    /// Returns a reference to the element at `index`, without checking that it exists.
    ///
    /// # Safety
    /// `index` must be less than [`len`](DynamicArray::len). This is only checked with a debug
    /// assertion.
    pub unsafe fn at_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len);
        // SAFETY: The caller guarantees that index < len and all values < len are initialized.
        unsafe { &*self.slots.as_ptr().add(index) }
    }

    /// Returns a mutable reference to the element at `index`, without checking that it exists.
    ///
    /// # Safety
    /// See [`at_unchecked`](DynamicArray::at_unchecked).
    pub unsafe fn at_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        // SAFETY: The caller guarantees that index < len and all values < len are initialized.
        // &mut self guarantees exclusivity.
        unsafe { &mut *self.slots.as_ptr().add(index) }
    }

    /// Returns a slice of the `len` live elements, in order.
    pub const fn data(&self) -> &[T] {
        // SAFETY: All values < len are initialized and len <= cap.
        unsafe { self.slots.prefix(self.len) }
    }

    /// Returns a mutable slice of the `len` live elements, in order. Elements can be modified in
    /// place, but not added or removed.
    pub fn data_mut(&mut self) -> &mut [T] {
        // SAFETY: All values < len are initialized and len <= cap.
        unsafe { self.slots.prefix_mut(self.len) }
    }

    /// Removes the last element and returns it. No elements are copied, so this can't fail for a
    /// non-empty DynamicArray.
    ///
    /// # Errors
    /// Returns [`IndexOutOfBounds`] if the DynamicArray is empty.
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let mut arr = DynamicArray::from_slice(&[1, 2]).unwrap();
    /// assert_eq!(arr.pop_back(), Ok(2));
    /// assert_eq!(arr.pop_back(), Ok(1));
    /// assert!(arr.pop_back().is_err());
    /// assert_eq!(arr.cap(), 2);
    /// ```
    pub fn pop_back(&mut self) -> Result<T, IndexOutOfBounds> {
        if self.len == 0 {
            return Err(IndexOutOfBounds { index: 0, len: 0 });
        }

        // Decrement len before reading so that the slot is never considered initialized twice.
        self.len -= 1;

        // SAFETY: The slot at the old len - 1 is initialized and is now outside of 0..len, so it
        // won't be read or dropped again.
        Ok(unsafe { self.slots.read(self.len) })
    }

    /// Drops all elements, keeping the current capacity.
    pub fn clear(&mut self) {
        // Zero len first, so that a panicking destructor can't leave dropped values reachable.
        let len = mem::replace(&mut self.len, 0);

        // SAFETY: The first len slots were initialized and are no longer considered live.
        unsafe { self.slots.drop_prefix(len) }
    }

    /// Checks that the provided index refers to a live element.
    pub(crate) const fn check_index(&self, index: usize) -> Result<(), IndexOutOfBounds> {
        if index >= self.len {
            Err(IndexOutOfBounds {
                index,
                len: self.len,
            })
        } else {
            Ok(())
        }
    }

    /// Replaces the backing buffer with the completed `staging` buffer. This is the only place
    /// where a rebuild touches self, and it can't fail.
    ///
    /// len and cap are updated before the old elements are dropped, so even if one of their
    /// destructors panics, the DynamicArray is already in its new, valid state.
    fn adopt(&mut self, staging: Staging<T>) {
        let (slots, len) = staging.into_parts();
        let old_cap = self.cap();

        let old_len = mem::replace(&mut self.len, len);
        let old_slots = mem::replace(&mut self.slots, slots);

        tracing::trace!(from_cap = old_cap, to_cap = self.cap(), len, "adopted rebuilt buffer");

        // SAFETY: old_slots held exactly old_len initialized values and is no longer reachable
        // from self.
        drop(unsafe { Staging::from_parts(old_slots, old_len) });
    }

    fn from_staging(staging: Staging<T>) -> DynamicArray<T> {
        let (slots, len) = staging.into_parts();
        DynamicArray { slots, len }
    }

    /// Returns the capacity after growing from `cap`.
    fn grown_cap(cap: usize) -> Result<usize, CapacityOverflow> {
        cap.checked_mul(GROWTH_FACTOR)
            .and_then(|c| c.checked_add(GROWTH_OFFSET))
            .ok_or(CapacityOverflow)
    }
}

impl<T: TryClone> DynamicArray<T> {
    /// Creates a DynamicArray containing copies of `values`, in order, with capacity exactly equal
    /// to `values.len()`. Nothing is allocated for an empty slice.
    ///
    /// # Errors
    /// Returns a [`MutationError`] if the buffer can't be allocated or one of the copies fails. In
    /// either case every copy made so far is dropped and the buffer is released.
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let arr = DynamicArray::from_slice(&["a", "b", "c"]).unwrap();
    /// assert_eq!(arr.data(), &["a", "b", "c"]);
    /// assert_eq!(arr.cap(), 3);
    /// ```
    pub fn from_slice(values: &[T]) -> Result<DynamicArray<T>, MutationError<T::Error>> {
        let mut staging = Staging::with_cap(values.len())?;

        staging.extend_copies(values)
            .map_err(|e| abandoned("from_slice", e))?;

        Ok(Self::from_staging(staging))
    }

    /// Appends a copy of `value` to the end of the DynamicArray, growing it if required. This is
    /// equivalent to `insert(len, value)`.
    ///
    /// # Errors
    /// See [`insert`](DynamicArray::insert).
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let mut arr = DynamicArray::new();
    /// for i in 0..4 {
    ///     arr.push_back(&i).unwrap();
    /// }
    /// assert_eq!(arr.data(), &[0, 1, 2, 3]);
    /// assert_eq!(arr.cap(), 7);
    /// ```
    pub fn push_back(&mut self, value: &T) -> Result<(), MutationError<T::Error>> {
        self.insert(self.len, value)
    }

    /// Inserts a copy of `value` at `index`, moving all following elements up by one. An index
    /// equal to `len` appends.
    ///
    /// If the DynamicArray is full, the capacity grows from `c` to `2 * c + 1`, otherwise it is
    /// unchanged.
    ///
    /// # Errors
    /// Returns a [`MutationError`] if `index > len`, the grown capacity overflows, the new buffer
    /// can't be allocated, or any of the copies fails. In every case, the DynamicArray is left
    /// unchanged.
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let mut arr = DynamicArray::from_slice(&[10, 10, 10, 10]).unwrap();
    /// arr.insert(2, &0).unwrap();
    /// assert_eq!(arr.data(), &[10, 10, 0, 10, 10]);
    /// assert_eq!(arr.cap(), 9);
    /// ```
    pub fn insert(&mut self, index: usize, value: &T) -> Result<(), MutationError<T::Error>> {
        if index > self.len {
            return Err(IndexOutOfBounds {
                index,
                len: self.len,
            }.into());
        }

        let new_cap = if self.len == self.cap() {
            Self::grown_cap(self.cap())?
        } else {
            self.cap()
        };

        let mut staging = Staging::with_cap(new_cap)?;
        let (head, tail) = self.data().split_at(index);

        staging.extend_copies(head)
            .and_then(|()| staging.push_copy(value))
            .and_then(|()| staging.extend_copies(tail))
            .map_err(|e| rolled_back("insert", e))?;

        self.adopt(staging);
        Ok(())
    }

    /// Removes the element at `index`, moving all following elements down by one. The capacity is
    /// never reduced.
    ///
    /// Erasing the last element only drops it, no copies are made. Otherwise the remaining elements
    /// are copied into a new buffer of the same capacity.
    ///
    /// # Errors
    /// Returns a [`MutationError`] if `index >= len`, the new buffer can't be allocated, or any of
    /// the copies fails. In every case, the DynamicArray is left unchanged.
    ///
    /// # Examples
    /// ```
    /// # use dynamic_array::collections::contiguous::DynamicArray;
    /// let mut arr = DynamicArray::from_slice(&[1, 2, 3, 4]).unwrap();
    /// arr.erase(1).unwrap();
    /// assert_eq!(arr.data(), &[1, 3, 4]);
    /// assert_eq!(arr.cap(), 4);
    /// ```
    pub fn erase(&mut self, index: usize) -> Result<(), MutationError<T::Error>> {
        self.check_index(index)?;

        if index == self.len - 1 {
            self.pop_back()?;
            return Ok(());
        }

        let mut staging = Staging::with_cap(self.cap())?;
        let (head, tail) = self.data().split_at(index);

        staging.extend_copies(head)
            .and_then(|()| staging.extend_copies(&tail[1..]))
            .map_err(|e| rolled_back("erase", e))?;

        self.adopt(staging);
        Ok(())
    }
}

/// Wraps a failed copy, logging that the mutation was rolled back.
fn rolled_back<E: Display>(op: &'static str, error: E) -> MutationError<E> {
    tracing::debug!(op, %error, "element copy failed, keeping previous state");
    MutationError::Copy(error)
}

/// Wraps a failed copy, logging that a new collection was discarded before completion.
fn abandoned<E: Display>(op: &'static str, error: E) -> MutationError<E> {
    tracing::debug!(op, %error, "element copy failed, discarding partial copy");
    MutationError::Copy(error)
}

impl<T> Default for DynamicArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for DynamicArray<T> {
    fn drop(&mut self) {
        // SAFETY: All values less than len are initialized and safe to drop. The slots are
        // deallocated afterwards when self.slots is dropped.
        unsafe { self.slots.drop_prefix(self.len) }
    }
}

impl<T> Index<usize> for DynamicArray<T> {
    type Output = T;

    /// # Panics
    /// Panics if `index >= len`.
    fn index(&self, index: usize) -> &Self::Output {
        self.at(index).throw()
    }
}

impl<T> IndexMut<usize> for DynamicArray<T> {
    /// # Panics
    /// Panics if `index >= len`.
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.at_mut(index).throw()
    }
}

impl<'a, T: TryClone> TryFrom<&'a [T]> for DynamicArray<T> {
    type Error = MutationError<T::Error>;

    fn try_from(value: &'a [T]) -> Result<Self, Self::Error> {
        DynamicArray::from_slice(value)
    }
}

impl<T: TryClone> TryClone for DynamicArray<T> {
    type Error = MutationError<T::Error>;

    /// Creates a deep copy with the same length and capacity.
    fn try_clone(&self) -> Result<Self, Self::Error> {
        let mut staging = Staging::with_cap(self.cap())?;

        staging.extend_copies(self.data())
            .map_err(|e| abandoned("try_clone", e))?;

        Ok(Self::from_staging(staging))
    }
}

impl<T: Clone> Clone for DynamicArray<T> {
    /// Creates a deep copy with the same length and capacity.
    ///
    /// # Panics
    /// Panics if the new buffer can't be allocated. If cloning an element panics, the copies made so
    /// far are dropped before the panic continues.
    fn clone(&self) -> Self {
        let mut staging = Staging::with_cap(self.cap()).throw();

        for value in self.data() {
            staging.push(value.clone());
        }

        Self::from_staging(staging)
    }
}

// SAFETY: A DynamicArray exclusively owns its buffer, so it can be sent between threads whenever
// T can.
unsafe impl<T: Send> Send for DynamicArray<T> {}
// SAFETY: DynamicArray's safe API obeys all rules of the borrow checker, so no interior mutability
// occurs. This means that DynamicArray<T> can safely implement Sync when T: Sync.
unsafe impl<T: Sync> Sync for DynamicArray<T> {}

impl<T: PartialEq> PartialEq for DynamicArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl<T: Eq> Eq for DynamicArray<T> {}

impl<T: Hash> Hash for DynamicArray<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data().hash(state);
    }
}

impl<T: Debug> Debug for DynamicArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicArray")
            .field("contents", &self.data())
            .field("len", &self.len)
            .field("cap", &self.cap())
            .finish()
    }
}

impl<T: Debug> Display for DynamicArray<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data()).finish()
    }
}
