//! # SPSC Render Pipeline
//!
//! Lock-free hand-off of encoded frames from the record thread to the
//! present thread.
//!
//! ## Safety Note
//!
//! This module requires unsafe code to hand out `&mut` / `&` access to
//! buffers stored in `UnsafeCell`s. Which side may touch a buffer is decided
//! solely by who currently holds its index.

#![allow(unsafe_code)]
//!
//! ## Architecture
//!
//! ```text
//!                 ┌───────────────────────────────────────────┐
//!                 │              RenderPipeline               │
//!                 │                                           │
//!                 │  ┌────────┐┌────────┐┌────────┐┌────────┐ │
//!                 │  │ buf 0  ││ buf 1  ││ buf 2  ││ buf 3  │ │
//!                 │  └────────┘└────────┘└────────┘└────────┘ │
//!                 │                                           │
//!                 │   free: SpscQueue<u32>   ready: SpscQueue  │
//!                 └───────────────────────────────────────────┘
//!                       │  ▲                    │  ▲
//!            pop free   │  │ push free   pop    │  │ push ready
//!                       ▼  │            ready   ▼  │
//!              ┌──────────────┐              ┌──────────────┐
//!              │FrameProducer │──submit────> │FrameConsumer │
//!              │ (record)     │ <──release── │ (present)    │
//!              └──────────────┘              └──────────────┘
//! ```
//!
//! ## Index State Machine
//!
//! ```text
//! Free ──begin_frame──> Writing ──submit_frame──> Ready ──try_consume──> Presenting
//!  ▲                                                                        │
//!  └─────────────────────────────release_buffer─────────────────────────────┘
//! ```
//!
//! Every index is in exactly one state at any instant. Ownership moves by
//! popping an index from one queue and pushing it to the other; the
//! release/acquire pairing of the queue cursors makes everything written into
//! a buffer before `submit_frame` visible to the consumer that pops it.
//!
//! ## Thread Safety
//!
//! - `FrameProducer`: the only popper of `free` and pusher of `ready`
//! - `FrameConsumer`: the only popper of `ready` and pusher of `free`
//! - Each role can be claimed once per pipeline

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::spsc_queue::SpscQueue;
use crate::render::{CommandBuffer, FrameBuffer};

/// Counters for profiling the hand-off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames pushed to the ready queue.
    pub submitted: u64,
    /// `begin_frame` calls that found no free buffer.
    pub skipped: u64,
    /// Frames popped by the consumer.
    pub consumed: u64,
    /// Consumed buffers released back to the free queue.
    pub presented: u64,
}

/// Pool of command buffers shared by one producer and one consumer.
///
/// - `CMD` - byte capacity of each command buffer
/// - `BUFFERS` - number of buffers in rotation (at least 2)
/// - `QUEUE` - slot count of the index queues: a power of two, greater than
///   `BUFFERS` so every index fits at once
///
/// ## Usage
///
/// ```rust
/// use ege_core::{FrameBuffer, RenderPipeline};
///
/// let pipeline = RenderPipeline::<256>::new();
/// let mut producer = pipeline.producer().unwrap();
/// let mut consumer = pipeline.consumer().unwrap();
///
/// // Record thread
/// if let Some(buf) = producer.begin_frame() {
///     buf.push_clear(0xFF00_0000);
///     buf.push_rect(0, 0xFFFF_FFFF, 10, 10, 8, 8);
/// }
/// producer.submit_frame();
///
/// // Present thread
/// let mut frame: FrameBuffer<16> = FrameBuffer::new();
/// let (buf, index) = consumer.try_consume();
/// if let Some(index) = index {
///     buf.decode(&mut frame);
///     consumer.release_buffer(index);
/// }
/// assert_eq!(frame.len(), 2);
/// ```
pub struct RenderPipeline<const CMD: usize, const BUFFERS: usize = 4, const QUEUE: usize = 8> {
    /// The buffers. Access is granted by holding the matching index.
    buffers: [UnsafeCell<CommandBuffer<CMD>>; BUFFERS],
    /// Handed out by `try_consume` when nothing is ready.
    empty: CommandBuffer<CMD>,
    /// Indices available to the producer.
    free: SpscQueue<u32, QUEUE>,
    /// Submitted indices awaiting the consumer, in submission order.
    ready: SpscQueue<u32, QUEUE>,
    /// Whether the producer role has been handed out.
    producer_claimed: AtomicBool,
    /// Whether the consumer role has been handed out.
    consumer_claimed: AtomicBool,
    submitted: AtomicU64,
    skipped: AtomicU64,
    consumed: AtomicU64,
    presented: AtomicU64,
}

// SAFETY: buffers are only reached through the index discipline above: the
// side holding an index has exclusive access to that buffer, and index
// transfer goes through the release/acquire queue cursors. Everything else
// is atomics or immutable.
unsafe impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> Sync
    for RenderPipeline<CMD, BUFFERS, QUEUE>
{
}

impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> RenderPipeline<CMD, BUFFERS, QUEUE> {
    /// Compile-time layout check, forced by [`new`](Self::new).
    const LAYOUT_IS_VALID: () = {
        assert!(BUFFERS >= 2, "RenderPipeline needs at least 2 buffers");
        assert!(BUFFERS <= u32::MAX as usize, "buffer indices must fit in u32");
        assert!(QUEUE > BUFFERS, "index queues must hold every buffer index (QUEUE - 1 >= BUFFERS)");
    };

    /// Creates a pipeline with every buffer in the free queue.
    #[must_use]
    #[allow(clippy::let_unit_value, clippy::cast_possible_truncation)]
    pub fn new() -> Arc<Self> {
        let () = Self::LAYOUT_IS_VALID;

        let mut free = SpscQueue::new();
        for index in 0..BUFFERS {
            let pushed = free.push(index as u32);
            debug_assert!(pushed, "free queue rejected index {index}");
        }

        Arc::new(Self {
            buffers: std::array::from_fn(|_| UnsafeCell::new(CommandBuffer::new())),
            empty: CommandBuffer::read_only(),
            free,
            ready: SpscQueue::new(),
            producer_claimed: AtomicBool::new(false),
            consumer_claimed: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
            presented: AtomicU64::new(0),
        })
    }

    /// Claims the producer role. Returns `None` if it was already claimed.
    ///
    /// The role is never handed out again, even after the handle is dropped.
    #[must_use]
    pub fn producer(self: &Arc<Self>) -> Option<FrameProducer<CMD, BUFFERS, QUEUE>> {
        if self.producer_claimed.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(FrameProducer {
            pipeline: Arc::clone(self),
            current: None,
        })
    }

    /// Claims the consumer role. Returns `None` if it was already claimed.
    #[must_use]
    pub fn consumer(self: &Arc<Self>) -> Option<FrameConsumer<CMD, BUFFERS, QUEUE>> {
        if self.consumer_claimed.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(FrameConsumer {
            pipeline: Arc::clone(self),
            held: 0,
        })
    }

    /// Number of buffers in rotation.
    #[inline]
    #[must_use]
    pub const fn buffer_count(&self) -> usize {
        BUFFERS
    }

    /// Byte capacity of each buffer.
    #[inline]
    #[must_use]
    pub const fn buffer_capacity(&self) -> usize {
        CMD
    }

    /// Indices currently in the free queue (a snapshot under concurrency).
    #[inline]
    #[must_use]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Indices currently in the ready queue (a snapshot under concurrency).
    #[inline]
    #[must_use]
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Returns the hand-off counters.
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            presented: self.presented.load(Ordering::Relaxed),
        }
    }

    /// Identity used to reject indices from other pipelines.
    #[inline]
    fn id(&self) -> usize {
        std::ptr::addr_of!(*self) as usize
    }

    /// Gets mutable access to a buffer.
    ///
    /// # Safety
    ///
    /// The caller must hold `index` on the producer side.
    #[inline]
    #[allow(clippy::mut_from_ref)]
    unsafe fn buffer_mut(&self, index: u32) -> &mut CommandBuffer<CMD> {
        &mut *self.buffers[index as usize].get()
    }

    /// Gets shared access to a buffer.
    ///
    /// # Safety
    ///
    /// The caller must hold `index` on the consumer side.
    #[inline]
    unsafe fn buffer(&self, index: u32) -> &CommandBuffer<CMD> {
        &*self.buffers[index as usize].get()
    }
}

impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> std::fmt::Debug
    for RenderPipeline<CMD, BUFFERS, QUEUE>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("buffers", &BUFFERS)
            .field("buffer_capacity", &CMD)
            .field("free", &self.free_len())
            .field("ready", &self.ready_len())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Token for a buffer held by the consumer.
///
/// Not `Copy` or `Clone`: handing it to
/// [`release_buffer`](FrameConsumer::release_buffer) consumes it, so a buffer
/// can't be released twice. Dropping it without releasing keeps the buffer out
/// of rotation for good.
#[must_use = "a consumed buffer must be released back to the pipeline"]
#[derive(Debug, PartialEq, Eq)]
pub struct BufferIndex {
    index: u32,
    pipeline: usize,
}

impl BufferIndex {
    /// The raw buffer index.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.index
    }
}

/// Record-side handle: acquires, fills and submits buffers.
///
/// ## Usage
///
/// ```rust,ignore
/// loop {
///     match producer.begin_frame() {
///         Some(buf) => record(buf),
///         None => continue, // every buffer is in flight: skip this frame
///     }
///     producer.submit_frame();
/// }
/// ```
pub struct FrameProducer<const CMD: usize, const BUFFERS: usize = 4, const QUEUE: usize = 8> {
    pipeline: Arc<RenderPipeline<CMD, BUFFERS, QUEUE>>,
    /// Index being recorded into, if any.
    current: Option<u32>,
}

impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> FrameProducer<CMD, BUFFERS, QUEUE> {
    /// Acquires a buffer to record into.
    ///
    /// Pops the free queue and returns the buffer reset and writable. Returns
    /// `None` when every buffer is outstanding; the caller should skip
    /// recording this cycle rather than wait.
    ///
    /// If a buffer is already held (no `submit_frame` since the last
    /// successful call), that same buffer is reset and returned again, but
    /// only while `free` is non-empty. With all buffers outstanding this
    /// returns `None` and the held recording is left intact.
    pub fn begin_frame(&mut self) -> Option<&mut CommandBuffer<CMD>> {
        let index = match self.current {
            Some(_) if self.pipeline.free.is_empty() => {
                self.pipeline.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("no free command buffer, held frame kept");
                return None;
            }
            Some(index) => index,
            None => {
                // SAFETY: this handle is the pipeline's only producer and the
                // producer is the only side that pops `free`.
                let Some(index) = (unsafe { self.pipeline.free.pop_shared() }) else {
                    self.pipeline.skipped.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!("no free command buffer, frame skipped");
                    return None;
                };
                debug_assert!((index as usize) < BUFFERS);
                self.current = Some(index);
                index
            }
        };

        // SAFETY: `index` came out of `free` and has not been submitted, so the
        // producer owns the buffer exclusively.
        let buffer = unsafe { self.pipeline.buffer_mut(index) };
        buffer.reset();
        buffer.set_writable(true);
        Some(buffer)
    }

    /// The buffer acquired by the last `begin_frame`, if not yet submitted.
    pub fn current_buffer(&mut self) -> Option<&mut CommandBuffer<CMD>> {
        let index = self.current?;
        // SAFETY: the producer holds `index`.
        Some(unsafe { self.pipeline.buffer_mut(index) })
    }

    /// Returns true between a successful `begin_frame` and `submit_frame`.
    #[inline]
    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.current.is_some()
    }

    /// Publishes the held buffer to the consumer.
    ///
    /// The buffer is frozen read-only and its index pushed to the ready queue.
    /// Without a held buffer this is a no-op returning false.
    pub fn submit_frame(&mut self) -> bool {
        let Some(index) = self.current else {
            return false;
        };

        // SAFETY: the producer still holds `index`.
        unsafe { self.pipeline.buffer_mut(index) }.set_writable(false);

        // SAFETY: the producer is the only side that pushes `ready`.
        if !unsafe { self.pipeline.ready.push_shared(index) } {
            tracing::error!(index, "ready queue full: buffer index accounting is broken");
            return false;
        }

        self.current = None;
        self.pipeline.submitted.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// The pipeline this handle records into.
    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &Arc<RenderPipeline<CMD, BUFFERS, QUEUE>> {
        &self.pipeline
    }
}

impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> Drop
    for FrameProducer<CMD, BUFFERS, QUEUE>
{
    fn drop(&mut self) {
        if let Some(index) = self.current {
            tracing::warn!(index, "producer dropped while recording; buffer leaves rotation");
        }
    }
}

impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> std::fmt::Debug
    for FrameProducer<CMD, BUFFERS, QUEUE>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameProducer")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Present-side handle: takes submitted buffers and gives them back.
pub struct FrameConsumer<const CMD: usize, const BUFFERS: usize = 4, const QUEUE: usize = 8> {
    pipeline: Arc<RenderPipeline<CMD, BUFFERS, QUEUE>>,
    /// Buffers taken by `try_consume` and not yet released.
    held: usize,
}

impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> FrameConsumer<CMD, BUFFERS, QUEUE> {
    /// Takes the oldest submitted buffer.
    ///
    /// Returns the buffer and its index token. When nothing is ready, returns
    /// the pipeline's empty read-only buffer and `None`.
    pub fn try_consume(&mut self) -> (&CommandBuffer<CMD>, Option<BufferIndex>) {
        // SAFETY: this handle is the pipeline's only consumer and the consumer
        // is the only side that pops `ready`.
        let Some(index) = (unsafe { self.pipeline.ready.pop_shared() }) else {
            return (&self.pipeline.empty, None);
        };
        debug_assert!((index as usize) < BUFFERS);

        self.held += 1;
        self.pipeline.consumed.fetch_add(1, Ordering::Relaxed);

        let token = BufferIndex {
            index,
            pipeline: self.pipeline.id(),
        };
        // SAFETY: `index` came out of `ready`. The producer gave it up with a
        // release push that our acquire pop synchronizes with, and won't touch
        // the buffer again until the index is back in `free`.
        (unsafe { self.pipeline.buffer(index) }, Some(token))
    }

    /// Returns a consumed buffer to the free queue.
    ///
    /// Returns false if the token belongs to another pipeline or the free
    /// queue refuses it; both indicate an accounting bug.
    pub fn release_buffer(&mut self, index: BufferIndex) -> bool {
        if index.pipeline != self.pipeline.id() || index.index as usize >= BUFFERS {
            tracing::error!(index = index.index, "release of a buffer this pipeline does not own");
            return false;
        }

        // SAFETY: the consumer is the only side that pushes `free`.
        if !unsafe { self.pipeline.free.push_shared(index.index) } {
            tracing::error!(index = index.index, "free queue full: buffer index accounting is broken");
            return false;
        }

        self.held -= 1;
        self.pipeline.presented.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Consumes, decodes into `target` and releases in one step.
    ///
    /// Returns true if a frame was decoded. `target` is left untouched when
    /// nothing was ready.
    pub fn consume_and_decode<const MAX: usize>(&mut self, target: &mut FrameBuffer<MAX>) -> bool {
        let (buffer, index) = self.try_consume();
        let Some(index) = index else {
            return false;
        };
        buffer.decode(target);
        self.release_buffer(index)
    }

    /// Buffers currently taken and not released.
    #[inline]
    #[must_use]
    pub const fn held_count(&self) -> usize {
        self.held
    }

    /// The pipeline this handle consumes from.
    #[inline]
    #[must_use]
    pub fn pipeline(&self) -> &Arc<RenderPipeline<CMD, BUFFERS, QUEUE>> {
        &self.pipeline
    }
}

impl<const CMD: usize, const BUFFERS: usize, const QUEUE: usize> std::fmt::Debug
    for FrameConsumer<CMD, BUFFERS, QUEUE>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameConsumer")
            .field("held", &self.held)
            .finish_non_exhaustive()
    }
}
