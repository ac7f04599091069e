//! # Memory Management
//!
//! Bump allocation over memory the caller sized up front.
//!
//! ## Design Philosophy
//!
//! All memory is provided once at startup. During a frame:
//! - No heap allocations
//! - No per-object frees, only a bulk reset
//! - Predictable, flat latency

mod arena;

pub use arena::StaticArena;
