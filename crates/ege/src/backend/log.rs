//! Backend that only logs, for bring-up on targets without a display driver.

use super::Backend;
use crate::error::{BackendError, BackendResult};
use crate::events::Event;
use crate::Frame;

/// Logs every call through `tracing` and counts frames.
///
/// Reports no input. Useful to check the loop and the pipeline on a target
/// before its display driver exists.
#[derive(Debug, Default)]
pub struct LogBackend {
    size: Option<(usize, usize)>,
    sample_rate: Option<u32>,
    presented: u64,
}

impl LogBackend {
    /// Creates an uninitialized backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented since creation.
    #[must_use]
    pub const fn presented(&self) -> u64 {
        self.presented
    }
}

impl Backend for LogBackend {
    fn name(&self) -> &'static str {
        "log"
    }

    fn init(&mut self, width: usize, height: usize) -> BackendResult<()> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidSurface { width, height });
        }
        self.size = Some((width, height));
        tracing::info!(width, height, "log backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.size = None;
        self.sample_rate = None;
        tracing::info!(presented = self.presented, "log backend shut down");
    }

    fn present(&mut self, frame: &Frame) {
        if self.size.is_none() {
            tracing::warn!("present before init, frame dropped");
            return;
        }
        self.presented += 1;
        tracing::debug!(frame = self.presented, commands = frame.len(), "present");
    }

    fn poll_input(&mut self, _out: &mut Vec<Event>) {}

    fn open_audio(&mut self, sample_rate: u32) -> BackendResult<()> {
        if sample_rate == 0 {
            return Err(BackendError::InvalidSampleRate(sample_rate));
        }
        self.sample_rate.get_or_insert(sample_rate);
        tracing::debug!(sample_rate, "log audio opened");
        Ok(())
    }

    fn trigger_sound(&mut self, id: u32, frequency: f32, duration: f32) {
        tracing::info!(id, frequency, duration, "sound");
    }

    fn try_pop_event(&mut self) -> Option<Event> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_backend_counts_frames() {
        let mut backend = LogBackend::new();
        backend.present(&Frame::new());
        assert_eq!(backend.presented(), 0);

        backend.init(8, 8).unwrap();
        backend.present(&Frame::new());
        backend.present(&Frame::new());
        assert_eq!(backend.presented(), 2);

        let mut events = Vec::new();
        backend.poll_input(&mut events);
        assert!(events.is_empty());
        assert!(backend.init(0, 0).is_err());
    }
}
