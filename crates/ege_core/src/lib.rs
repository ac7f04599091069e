//! # EGE Core
//!
//! The frame pipeline of the EGE engine: a lock-free path from the thread that
//! records render commands to the thread that presents them.
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations per frame** - buffers, queues and arenas are sized up front
//! 2. **No locks** - ownership moves through SPSC index queues
//! 3. **Compile-time capacities** - every size is a const generic
//!
//! ## Example
//!
//! ```rust
//! use ege_core::{Command, FrameBuffer, RenderPipeline};
//!
//! let pipeline = RenderPipeline::<1024>::new();
//! let mut producer = pipeline.producer().unwrap();
//! let mut consumer = pipeline.consumer().unwrap();
//!
//! let buf = producer.begin_frame().unwrap();
//! buf.push_clear(0xFF10_2030);
//! producer.submit_frame();
//!
//! let mut frame: FrameBuffer<64> = FrameBuffer::new();
//! assert!(consumer.consume_and_decode(&mut frame));
//! assert_eq!(frame.commands(), &[Command::Clear { color: 0xFF10_2030 }]);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;
pub mod render;
pub mod sync;

pub use error::{ArenaError, ArenaResult, CodecError, CodecResult};
pub use memory::StaticArena;
pub use render::{Command, CommandBuffer, Decoder, FrameBuffer, Opcode, Rect};
pub use sync::{
    BufferIndex, FrameConsumer, FrameProducer, PipelineStats, RenderPipeline, SpscQueue,
};
