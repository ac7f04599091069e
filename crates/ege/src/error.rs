//! # Runtime Error Types
//!
//! Failures outside the frame pipeline: backends, configuration and the
//! runtime lifecycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a [`Backend`](crate::backend::Backend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Width or height is zero, or the pixel count does not fit in memory.
    #[error("invalid surface size {width}x{height}")]
    InvalidSurface {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// Sample rate is zero.
    #[error("invalid audio sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// Errors produced while loading a [`RuntimeConfig`](crate::config::RuntimeConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has fields of the wrong type.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds a value the runtime can't run with.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from the runtime lifecycle.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `run` or `step` was called before `init`, or after `teardown`.
    #[error("runtime is not initialized")]
    NotInitialized,

    /// The pipeline's producer or consumer role was already taken.
    #[error("render pipeline {0} role already claimed")]
    PipelineClaimed(&'static str),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
