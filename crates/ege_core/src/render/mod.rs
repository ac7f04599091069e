//! # Render Commands
//!
//! What the producer records and the consumer presents.
//!
//! ```text
//! Producer:  Command ──encode──> CommandBuffer (bytes)
//!                                     │
//!                               (pipeline hand-off)
//!                                     ▼
//! Consumer:  FrameBuffer <──decode── CommandBuffer (bytes)
//! ```

mod codec;
mod command;
mod frame;

pub use codec::{CommandBuffer, Decoder};
pub use command::{ClearRecord, Command, Opcode, Rect, RectRecord};
pub use frame::FrameBuffer;
