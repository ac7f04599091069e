//! # Core Error Types
//!
//! Recoverable failures of the arena and the checked encoder.
//!
//! Everything else in the pipeline reports absence through `bool` or
//! `Option`: an empty queue, an exhausted pool and a truncated record are
//! expected conditions, not errors.

use thiserror::Error;

/// Errors returned by [`StaticArena`](crate::memory::StaticArena).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// Not enough space left for the request plus its alignment padding.
    #[error("arena out of memory: requested {requested} bytes (+{padding} padding), {remaining} remaining")]
    OutOfMemory {
        /// Bytes requested.
        requested: usize,
        /// Padding needed to reach the requested alignment.
        padding: usize,
        /// Bytes left in the arena before the request.
        remaining: usize,
    },

    /// The alignment is zero or not a power of two.
    #[error("invalid alignment: {0} is not a power of two")]
    InvalidAlignment(usize),
}

/// Errors returned by the checked `try_push_*` encoders.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The record does not fit in the remaining buffer space.
    #[error("command buffer full: record needs {needed} bytes, {remaining} remaining")]
    CapacityExceeded {
        /// Size of the record that was rejected.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// The buffer is frozen (submitted, or the pipeline's empty buffer).
    #[error("attempt to write to a read-only command buffer")]
    ReadOnly,
}

/// Result type for arena operations.
pub type ArenaResult<T> = Result<T, ArenaError>;

/// Result type for checked encoding.
pub type CodecResult<T> = Result<T, CodecError>;
