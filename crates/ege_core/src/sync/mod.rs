//! # Lock-Free Frame Hand-Off
//!
//! No locks. No blocking. One producer, one consumer.
//!
//! ## The Problem
//!
//! ```text
//! Thread 1 (Record):   encodes frame N+1 into a command buffer
//! Thread 2 (Present):  decodes and draws frame N
//!
//! Shared buffer without synchronization: TORN FRAMES
//! With a Mutex:                          STALLS ON BOTH SIDES
//! ```
//!
//! ## The Solution: Index Hand-Off
//!
//! ```text
//! A fixed pool of command buffers, and two SPSC queues of buffer indices:
//!
//!   free:  indices the producer may record into
//!   ready: indices the consumer should present, oldest first
//!
//! Whoever holds an index owns that buffer. Indices are only ever moved
//! between the queues, never copied, so no buffer has two owners.
//! ```

mod pipeline;
mod spsc_queue;

pub use pipeline::{BufferIndex, FrameConsumer, FrameProducer, PipelineStats, RenderPipeline};
pub use spsc_queue::{QueueConsumer, QueueProducer, SpscQueue};
