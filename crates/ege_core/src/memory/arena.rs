//! # Static Arena
//!
//! A bump allocator over a caller-owned buffer. Nothing is freed individually;
//! the whole arena is rewound at once.

#![allow(unsafe_code)]

use std::cell::Cell;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::ptr::NonNull;

use bytemuck::Pod;

use crate::error::{ArenaError, ArenaResult};

/// A bump-pointer arena over borrowed memory.
///
/// Allocation is O(1): pad the cursor up to the requested alignment, check
/// the remaining space, bump. There is no per-allocation bookkeeping.
///
/// Every slice handed out borrows the arena, so [`reset`](Self::reset)
/// (which takes `&mut self`) can only run once all of them are gone.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread.
///
/// # Example
///
/// ```rust
/// use ege_core::StaticArena;
///
/// let mut backing = [0u8; 1024];
/// let mut arena = StaticArena::new(&mut backing);
///
/// let block = arena.allocate(64, 16).unwrap();
/// assert_eq!(block.as_ptr() as usize % 16, 0);
///
/// arena.reset();
/// assert_eq!(arena.used(), 0);
/// ```
pub struct StaticArena<'buf> {
    /// Start of the backing buffer.
    start: NonNull<u8>,
    /// Total capacity in bytes.
    capacity: usize,
    /// Current allocation offset from `start`.
    offset: Cell<usize>,
    /// Ties the arena to the exclusive borrow of the backing buffer.
    _buffer: PhantomData<&'buf mut [u8]>,
}

impl<'buf> StaticArena<'buf> {
    /// Creates an arena that allocates out of `buffer`.
    #[must_use]
    pub fn new(buffer: &'buf mut [u8]) -> Self {
        let capacity = buffer.len();
        Self {
            start: NonNull::from(buffer).cast::<u8>(),
            capacity,
            offset: Cell::new(0),
            _buffer: PhantomData,
        }
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the bytes consumed so far, alignment padding included.
    #[inline]
    #[must_use]
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Returns the remaining free space in bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }

    /// Carves `size` bytes aligned to `align` out of the arena.
    ///
    /// Alignment is applied to the real address, so the result is aligned
    /// even when the backing buffer itself is not.
    ///
    /// # Errors
    ///
    /// - [`ArenaError::InvalidAlignment`] if `align` is not a power of two.
    /// - [`ArenaError::OutOfMemory`] if `size` plus the alignment padding
    ///   exceeds the remaining space. The cursor does not move.
    #[allow(clippy::mut_from_ref)]
    pub fn allocate(&self, size: usize, align: usize) -> ArenaResult<&mut [u8]> {
        if !align.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment(align));
        }

        let offset = self.offset.get();
        let remaining = self.capacity - offset;
        let address = self.start.as_ptr() as usize + offset;
        let padding = address.wrapping_neg() & (align - 1);

        if padding > remaining || size > remaining - padding {
            return Err(ArenaError::OutOfMemory {
                requested: size,
                padding,
                remaining,
            });
        }

        let begin = offset + padding;
        self.offset.set(begin + size);

        // SAFETY: `begin + size <= capacity`, so the range lies inside the
        // buffer borrowed for 'buf. The cursor only grows until `reset`, which
        // needs `&mut self`, so no other live slice overlaps this one.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.start.as_ptr().add(begin), size) })
    }

    /// Allocates a single `T` and moves `value` into it.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the arena is exhausted.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T: Pod>(&self, value: T) -> ArenaResult<&mut T> {
        let bytes = self.allocate(size_of::<T>(), align_of::<T>())?;
        let slot: &mut T = bytemuck::from_bytes_mut(bytes);
        *slot = value;
        Ok(slot)
    }

    /// Allocates `count` zeroed elements of `T`.
    ///
    /// Zero-sized types yield an empty slice without touching the arena.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::OutOfMemory`] if the arena is exhausted or the
    /// byte size overflows.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice<T: Pod>(&self, count: usize) -> ArenaResult<&mut [T]> {
        if size_of::<T>() == 0 {
            return Ok(&mut []);
        }

        let size = size_of::<T>()
            .checked_mul(count)
            .ok_or(ArenaError::OutOfMemory {
                requested: usize::MAX,
                padding: 0,
                remaining: self.remaining(),
            })?;

        let bytes = self.allocate(size, align_of::<T>())?;
        bytes.fill(0);
        Ok(bytemuck::cast_slice_mut(bytes))
    }

    /// Rewinds the arena, invalidating all previous allocations.
    ///
    /// No memory is freed or touched. The borrow checker guarantees no
    /// slice from before the reset is still alive.
    #[inline]
    pub fn reset(&mut self) {
        self.offset.set(0);
    }
}

impl std::fmt::Debug for StaticArena<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticArena")
            .field("capacity", &self.capacity)
            .field("used", &self.used())
            .finish()
    }
}
