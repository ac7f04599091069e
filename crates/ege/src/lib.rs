//! # EGE
//!
//! The runtime around the [`ege_core`] frame pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                               Runtime                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │   Backend       │────>│   LayerStack    │────>│  RenderPipeline │   │
//! │  │                 │     │                 │     │   (ege_core)    │   │
//! │  │  • input        │     │  • on_event     │     │  • record       │   │
//! │  │  • present      │<────│  • on_update    │     │  • hand-off     │   │
//! │  │  • audio        │     │  • on_render    │     │  • decode       │   │
//! │  └─────────────────┘     └─────────────────┘     └─────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events`: what backends report and layers react to
//! - `backend`: the backend contract and the reference backends
//! - `layer`: application hooks
//! - `runtime`: the loop
//! - `config`: TOML configuration
//! - `raster`, `audio`: software rendering and tone synthesis

pub mod audio;
pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod layer;
pub mod raster;
pub mod runtime;

pub use ege_core as core;

use ege_core::{CommandBuffer, FrameBuffer, RenderPipeline};

/// Bytes of encoded commands one frame may hold.
pub const COMMAND_BUFFER_BYTES: usize = 1024;

/// Decoded commands one frame may hold.
pub const MAX_FRAME_COMMANDS: usize = 1024;

/// A decoded frame as presented by backends.
pub type Frame = FrameBuffer<MAX_FRAME_COMMANDS>;

/// The command buffer layers record into.
pub type RenderBuffer = CommandBuffer<COMMAND_BUFFER_BYTES>;

/// The pipeline the runtime drives: 4 buffers, 8-slot index queues.
pub type EnginePipeline = RenderPipeline<COMMAND_BUFFER_BYTES, 4, 8>;

// Re-export commonly used types
pub use backend::{create_backend, Backend, BackendKind, HeadlessBackend, LogBackend};
pub use config::RuntimeConfig;
pub use error::{BackendError, ConfigError, RuntimeError};
pub use events::{Event, InputEvent};
pub use layer::{Layer, LayerStack, RenderContext};
pub use runtime::{FrameStats, FrameStatsAccumulator, Runtime, StopHandle};
