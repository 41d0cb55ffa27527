use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::slice;

use crate::util::error::{AllocError, BufferError, CapacityOverflow};

/// An exclusively owned, contiguous allocation of `cap` slots for values of `T`.
///
/// Slots never track which of their values are initialized, that is left to the owner. Dropping
/// a `Slots<T>` deallocates the memory but never drops any values within it, so the owner has to
/// drop whatever it initialized first (see [`Slots::drop_prefix`]).
///
/// A capacity of zero never allocates, and neither does any capacity for a zero-sized `T`. In both
/// cases the pointer is dangling but properly aligned.
pub(crate) struct Slots<T> {
    ptr: NonNull<T>,
    cap: usize,
    _phantom: PhantomData<T>,
}

impl<T> Slots<T> {
    /// Creates a `Slots<T>` with capacity 0 without allocating.
    pub(crate) const fn dangling() -> Slots<T> {
        Slots {
            ptr: NonNull::dangling(),
            cap: 0,
            _phantom: PhantomData,
        }
    }

    /// Allocates `cap` uninitialized slots.
    ///
    /// # Errors
    /// Returns [`CapacityOverflow`] if the memory layout size would exceed [`isize::MAX`], or an
    /// [`AllocError`] if the global allocator can't satisfy the request. Unlike the standard
    /// collections, allocation failure doesn't abort.
    pub(crate) fn new_uninit(cap: usize) -> Result<Slots<T>, BufferError> {
        let layout = Self::make_layout(cap)?;
        let ptr = Self::make_ptr(layout, cap)?;

        Ok(Slots {
            ptr,
            cap,
            _phantom: PhantomData,
        })
    }

    pub(crate) const fn cap(&self) -> usize {
        self.cap
    }

    /// Returns true if this buffer is backed by memory from the global allocator.
    #[cfg(test)]
    pub(crate) const fn is_allocated(&self) -> bool {
        self.cap != 0 && size_of::<T>() != 0
    }

    pub(crate) const fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Writes `value` into the slot at `index`, without reading or dropping the old contents.
    ///
    /// # Safety
    /// `index` must be less than the capacity. Any value previously in the slot is leaked.
    pub(crate) unsafe fn write(&mut self, index: usize, value: T) {
        // SAFETY: The caller guarantees that index is within the allocated range, and the layout
        // guarantees that the offset in bytes can't overflow isize.
        unsafe { self.ptr.add(index).write(value) }
    }

    /// Reads the value out of the slot at `index`, leaving the slot logically uninitialized.
    ///
    /// # Safety
    /// `index` must be less than the capacity and the slot must be initialized. The caller must
    /// treat the slot as uninitialized afterwards.
    pub(crate) unsafe fn read(&self, index: usize) -> T {
        // SAFETY: The caller guarantees that the slot is in bounds and initialized.
        unsafe { self.ptr.add(index).read() }
    }

    /// Views the first `len` slots as a slice.
    ///
    /// # Safety
    /// `len` must be no greater than the capacity and all slots in `0..len` must be initialized.
    pub(crate) const unsafe fn prefix(&self, len: usize) -> &[T] {
        // SAFETY: The pointer is nonnull and aligned, even for capacity 0. The caller guarantees
        // that len values are initialized and within the allocation, whose size in bytes can't
        // exceed isize::MAX.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), len) }
    }

    /// Views the first `len` slots as a mutable slice.
    ///
    /// # Safety
    /// See [`Slots::prefix`].
    pub(crate) unsafe fn prefix_mut(&mut self, len: usize) -> &mut [T] {
        // SAFETY: As for prefix, with exclusivity guaranteed by &mut self.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), len) }
    }

    /// Drops the values in the first `len` slots in place.
    ///
    /// If one of the destructors panics, the remaining values are still dropped before the panic
    /// continues.
    ///
    /// # Safety
    /// `len` must be no greater than the capacity, all slots in `0..len` must be initialized and the
    /// caller must treat them as uninitialized afterwards.
    pub(crate) unsafe fn drop_prefix(&mut self, len: usize) {
        // SAFETY: The caller guarantees that the prefix is initialized and won't be used again.
        unsafe { ptr::drop_in_place(self.prefix_mut(len)) }
    }

    /// A helper function to create a [`Layout`] for use during allocation, containing `cap` number
    /// of elements of type `T`.
    pub(crate) fn make_layout(cap: usize) -> Result<Layout, CapacityOverflow> {
        Layout::array::<T>(cap).map_err(|_| CapacityOverflow)
    }

    /// A helper function to create a [`NonNull`] for the provided [`Layout`]. Returns a dangling
    /// pointer for a zero-sized layout.
    fn make_ptr(layout: Layout, cap: usize) -> Result<NonNull<T>, AllocError> {
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: Zero-sized layouts have been guarded against.
        let raw_ptr = unsafe { alloc::alloc(layout) };

        NonNull::new(raw_ptr.cast()).ok_or_else(|| {
            tracing::debug!(cap, bytes = layout.size(), "allocation failed");
            AllocError { cap }
        })
    }
}

impl<T> Drop for Slots<T> {
    fn drop(&mut self) {
        // The layout was already validated when this buffer was created.
        let Ok(layout) = Self::make_layout(self.cap) else { return };

        if layout.size() != 0 {
            // SAFETY: ptr was allocated in the global allocator with this exact layout. Zero-sized
            // layouts aren't allocated and are guarded against deallocation.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), layout) }
        }
    }
}
