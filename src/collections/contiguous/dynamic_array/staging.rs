use std::mem::ManuallyDrop;
use std::ptr;

use crate::collections::contiguous::slots::Slots;
use crate::collections::traits::TryClone;
use crate::util::error::BufferError;

/// A replacement buffer under construction.
///
/// Values are appended to the front of the buffer in order and `filled` tracks how many are
/// initialized. Until [`Staging::into_parts`] hands the buffer over, dropping a `Staging` drops
/// every value written so far and releases the allocation. This holds on every exit path,
/// including an early return through `?` and unwinding from a panicking copy.
pub(crate) struct Staging<T> {
    slots: Slots<T>,
    filled: usize,
}

impl<T> Staging<T> {
    pub(crate) fn with_cap(cap: usize) -> Result<Staging<T>, BufferError> {
        Ok(Staging {
            slots: Slots::new_uninit(cap)?,
            filled: 0,
        })
    }

    /// Takes ownership of a buffer with `filled` initialized values, which will all be dropped
    /// along with the Staging.
    ///
    /// # Safety
    /// The first `filled` slots of `slots` must be initialized and `filled` must not exceed the
    /// capacity.
    pub(crate) const unsafe fn from_parts(slots: Slots<T>, filled: usize) -> Staging<T> {
        Staging { slots, filled }
    }

    /// Appends `value` after the values written so far.
    ///
    /// # Panics
    /// Panics if every slot has already been filled.
    pub(crate) fn push(&mut self, value: T) {
        assert!(self.filled < self.slots.cap(), "Staging buffer overfilled!");

        // SAFETY: filled < cap was just checked.
        unsafe { self.slots.write(self.filled, value) }
        self.filled += 1;
    }

    /// Appends a copy of `value`.
    ///
    /// # Panics
    /// Panics if every slot has already been filled.
    pub(crate) fn push_copy(&mut self, value: &T) -> Result<(), T::Error>
    where
        T: TryClone,
    {
        let copy = value.try_clone()?;
        self.push(copy);
        Ok(())
    }

    /// Appends copies of every value in `values`, in order. Stops at the first failed copy, keeping
    /// the copies made before it.
    ///
    /// # Panics
    /// Panics if there aren't enough free slots for all of `values`.
    pub(crate) fn extend_copies(&mut self, values: &[T]) -> Result<(), T::Error>
    where
        T: TryClone,
    {
        assert!(values.len() <= self.slots.cap() - self.filled, "Staging buffer overfilled!");

        for value in values {
            self.push_copy(value)?;
        }
        Ok(())
    }

    /// Decomposes the Staging into its buffer and the number of initialized values at its front.
    /// After this, the values are no longer dropped automatically.
    pub(crate) fn into_parts(self) -> (Slots<T>, usize) {
        let this = ManuallyDrop::new(self);
        // SAFETY: this is never dropped or used again, so the buffer is moved out exactly once.
        let slots = unsafe { ptr::read(&this.slots) };
        (slots, this.filled)
    }
}

impl<T> Drop for Staging<T> {
    fn drop(&mut self) {
        // SAFETY: Exactly the first filled slots have been initialized. self.slots is dropped
        // afterwards, releasing the allocation even if one of these destructors panics.
        unsafe { self.slots.drop_prefix(self.filled) }
    }
}
