//! # SPSC Ring Queue
//!
//! Fixed-capacity circular buffer for exactly one producer thread and one
//! consumer thread. No locks, never blocks.
//!
//! ## Safety Note
//!
//! Slots live in `UnsafeCell`s; the head/tail cursors decide who may touch
//! which slot. All unsafe blocks are confined to this module.
//!
//! ## Layout
//!
//! ```text
//!   tail (consumer)           head (producer)
//!      │                          │
//!      ▼                          ▼
//!  ┌───┬───┬───┬───┬───┬───┬───┬───┐
//!  │   │ a │ b │ c │ d │   │   │   │   N = 8, usable = 7
//!  └───┴───┴───┴───┴───┴───┴───┴───┘
//!
//!  empty:  head == tail
//!  full:   (head + 1) & (N - 1) == tail      (one slot always reserved)
//! ```
//!
//! ## Memory Ordering
//!
//! The producer writes the slot, then publishes it with a `Release` store to
//! `head`. The consumer `Acquire`-loads `head` before reading the slot. The
//! same pairing on `tail` hands emptied slots back to the producer.

#![allow(unsafe_code)]

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A lock-free single-producer single-consumer ring queue.
///
/// `N` must be a power of two (and at least 2). Anything else fails to
/// compile as soon as the queue is constructed:
///
/// ```rust,compile_fail
/// let queue = ege_core::SpscQueue::<u32, 6>::new();
/// ```
///
/// With `&mut` access the queue behaves like an ordinary bounded FIFO. To use
/// it across threads, [`split`](Self::split) it into a producer half and a
/// consumer half; neither half can be cloned, which keeps the access pattern
/// single-producer single-consumer.
///
/// ## Usage
///
/// ```rust
/// use ege_core::SpscQueue;
///
/// let mut queue: SpscQueue<u32, 8> = SpscQueue::new();
/// for i in 0..7 {
///     assert!(queue.push(i));
/// }
/// assert!(!queue.push(99)); // full: one slot is reserved
/// assert_eq!(queue.pop(), Some(0));
/// ```
pub struct SpscQueue<T, const N: usize> {
    /// Ring storage. A slot is initialized iff it lies in `tail..head`.
    slots: [UnsafeCell<MaybeUninit<T>>; N],
    /// Next slot the producer writes. Only the producer stores to it.
    head: AtomicUsize,
    /// Next slot the consumer reads. Only the consumer stores to it.
    tail: AtomicUsize,
}

// SAFETY: values are moved between threads through the slots, which needs
// `T: Send`. Shared access is sound because slot ownership is decided by the
// cursors, and only the producer half writes `head` / the consumer half
// writes `tail`.
unsafe impl<T: Send, const N: usize> Send for SpscQueue<T, N> {}
// SAFETY: see above. Every safe `&self` method only loads the cursors.
unsafe impl<T: Send, const N: usize> Sync for SpscQueue<T, N> {}

impl<T: Copy, const N: usize> SpscQueue<T, N> {
    /// Compile-time capacity check, forced by [`new`](Self::new).
    const CAPACITY_IS_POWER_OF_TWO: () = assert!(
        N >= 2 && N.is_power_of_two(),
        "SpscQueue capacity must be a power of two (>= 2)"
    );

    /// Index wrap mask.
    const MASK: usize = N - 1;

    /// Creates an empty queue.
    #[must_use]
    #[allow(clippy::let_unit_value)]
    pub fn new() -> Self {
        let () = Self::CAPACITY_IS_POWER_OF_TWO;

        Self {
            slots: std::array::from_fn(|_| UnsafeCell::new(MaybeUninit::uninit())),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Usable capacity: `N - 1`.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Number of queued values.
    ///
    /// Exact when no other thread is pushing or popping; otherwise a snapshot
    /// that may already be stale.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & Self::MASK
    }

    /// Returns true if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a push would fail.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len() == N - 1
    }

    /// Appends `value`. Returns false, leaving the queue untouched, if full.
    #[inline]
    #[must_use]
    pub fn push(&mut self, value: T) -> bool {
        // SAFETY: `&mut self` rules out any concurrent caller.
        unsafe { self.push_shared(value) }
    }

    /// Removes the oldest value, or returns `None` if empty.
    #[inline]
    #[must_use]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: `&mut self` rules out any concurrent caller.
        unsafe { self.pop_shared() }
    }

    /// Splits the queue into its producer and consumer halves.
    ///
    /// Each half is `Send` and can be moved to its own thread (for example
    /// with [`std::thread::scope`]).
    pub fn split(&mut self) -> (QueueProducer<'_, T, N>, QueueConsumer<'_, T, N>) {
        let queue = &*self;
        (QueueProducer { queue }, QueueConsumer { queue })
    }

    /// Producer-side push through a shared reference.
    ///
    /// # Safety
    ///
    /// At most one thread may be inside `push_shared` for this queue at any
    /// time. Concurrent `pop_shared` from one other thread is fine.
    #[inline]
    pub(crate) unsafe fn push_shared(&self, value: T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & Self::MASK;

        // Acquire: the consumer must be done reading the slot we reuse.
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }

        // SAFETY: `head` is outside `tail..head`, so the consumer will not
        // read it until the store below publishes it, and we are the only
        // producer.
        (*self.slots[head].get()).write(value);

        // Release: the slot write happens-before any pop that observes `next`.
        self.head.store(next, Ordering::Release);
        true
    }

    /// Consumer-side pop through a shared reference.
    ///
    /// # Safety
    ///
    /// At most one thread may be inside `pop_shared` for this queue at any
    /// time. Concurrent `push_shared` from one other thread is fine.
    #[inline]
    pub(crate) unsafe fn pop_shared(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);

        // Acquire: pairs with the producer's release store of `head`.
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `tail` is inside `tail..head`, so it was initialized by a
        // push whose write is visible through the acquire above. `T: Copy`,
        // so reading it out leaves nothing to drop.
        let value = (*self.slots[tail].get()).assume_init_read();

        // Release: our read happens-before the producer reusing the slot.
        self.tail.store((tail + 1) & Self::MASK, Ordering::Release);
        Some(value)
    }
}

impl<T: Copy, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> std::fmt::Debug for SpscQueue<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpscQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Producer half of a split [`SpscQueue`].
#[derive(Debug)]
pub struct QueueProducer<'q, T: Copy, const N: usize> {
    queue: &'q SpscQueue<T, N>,
}

impl<T: Copy, const N: usize> QueueProducer<'_, T, N> {
    /// Appends `value`. Returns false if the queue is full; never blocks.
    #[inline]
    #[must_use]
    pub fn push(&mut self, value: T) -> bool {
        // SAFETY: this half is the only producer and is not `Clone`;
        // `&mut self` serializes calls through it.
        unsafe { self.queue.push_shared(value) }
    }

    /// Returns true if a push would currently fail.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }
}

/// Consumer half of a split [`SpscQueue`].
#[derive(Debug)]
pub struct QueueConsumer<'q, T: Copy, const N: usize> {
    queue: &'q SpscQueue<T, N>,
}

impl<T: Copy, const N: usize> QueueConsumer<'_, T, N> {
    /// Removes the oldest value, or returns `None` if empty; never blocks.
    #[inline]
    #[must_use]
    pub fn pop(&mut self) -> Option<T> {
        // SAFETY: this half is the only consumer and is not `Clone`;
        // `&mut self` serializes calls through it.
        unsafe { self.queue.pop_shared() }
    }

    /// Returns true if nothing is queued right now.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_capacity_eight() {
        let mut q: SpscQueue<i32, 8> = SpscQueue::new();
        assert_eq!(q.capacity(), 7);

        for i in 0..7 {
            assert!(q.push(i));
        }
        assert!(q.is_full());
        assert!(!q.push(99)); // full
        assert_eq!(q.len(), 7);

        for i in 0..7 {
            assert_eq!(q.pop(), Some(i));
        }
        assert_eq!(q.pop(), None); // empty
        assert!(q.is_empty());
    }

    #[test]
    fn test_full_push_does_not_mutate() {
        let mut q: SpscQueue<u32, 4> = SpscQueue::new();
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        assert!(!q.push(4));
        assert_eq!(q.len(), 3);

        // One pop frees exactly one slot.
        assert_eq!(q.pop(), Some(1));
        assert!(q.push(4));
        assert!(!q.push(5));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(3));
        assert_eq!(q.pop(), Some(4));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_wrap_around_keeps_order() {
        let mut q: SpscQueue<u64, 4> = SpscQueue::new();
        let mut next_in = 0u64;
        let mut next_out = 0u64;

        // Cursors wrap many times; interleave 2 pushes / 1 pop then drain.
        for _ in 0..1000 {
            while q.push(next_in) {
                next_in += 1;
            }
            for _ in 0..2 {
                if let Some(v) = q.pop() {
                    assert_eq!(v, next_out);
                    next_out += 1;
                }
            }
        }
        while let Some(v) = q.pop() {
            assert_eq!(v, next_out);
            next_out += 1;
        }
        assert_eq!(next_in, next_out);
    }

    #[test]
    fn test_minimum_capacity_queue() {
        let mut q: SpscQueue<u8, 2> = SpscQueue::new();
        assert_eq!(q.capacity(), 1);
        assert!(q.push(7));
        assert!(!q.push(8));
        assert_eq!(q.pop(), Some(7));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_split_cross_thread_fifo() {
        const COUNT: u32 = 20_000;
        let mut q: SpscQueue<u32, 64> = SpscQueue::new();
        let (mut producer, mut consumer) = q.split();

        std::thread::scope(|s| {
            s.spawn(move || {
                for i in 0..COUNT {
                    while !producer.push(i) {
                        std::thread::yield_now();
                    }
                }
            });

            s.spawn(move || {
                let mut expected = 0;
                while expected < COUNT {
                    match consumer.pop() {
                        Some(v) => {
                            assert_eq!(v, expected);
                            expected += 1;
                        }
                        None => std::thread::yield_now(),
                    }
                }
                assert!(consumer.is_empty());
            });
        });

        assert!(q.is_empty());
    }
}
