//! Backend that draws into memory.

use ege_core::SpscQueue;

use super::Backend;
use crate::audio::{synthesize_tone, AudioQueue, DEFAULT_SAMPLE_RATE};
use crate::error::{BackendError, BackendResult};
use crate::events::Event;
use crate::raster::Canvas;
use crate::Frame;

/// Slots in the headless event queue (one is always kept free).
pub const EVENT_QUEUE_SLOTS: usize = 1024;

/// A backend with no window and no device.
///
/// Frames are rasterized into a [`Canvas`], tones are queued in an
/// [`AudioQueue`], and input is whatever was [`inject`](Self::inject)ed.
/// Used for tests and for running the engine on a server.
pub struct HeadlessBackend {
    canvas: Option<Canvas>,
    events: SpscQueue<Event, EVENT_QUEUE_SLOTS>,
    audio: AudioQueue,
    sample_rate: Option<u32>,
    presented: u64,
    last_frame_len: usize,
    dropped_events: u64,
}

impl HeadlessBackend {
    /// Creates an uninitialized backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            canvas: None,
            events: SpscQueue::new(),
            audio: AudioQueue::new(),
            sample_rate: None,
            presented: 0,
            last_frame_len: 0,
            dropped_events: 0,
        }
    }

    /// Queues an input event for the next poll. Returns false, dropping the
    /// event, if the queue is full.
    pub fn inject(&mut self, event: Event) -> bool {
        if self.events.push(event) {
            return true;
        }
        self.dropped_events += 1;
        tracing::debug!(?event, "headless event queue full, event dropped");
        false
    }

    /// The last presented image, or `None` before `init`.
    #[must_use]
    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    /// Frames presented since creation.
    #[must_use]
    pub const fn presented(&self) -> u64 {
        self.presented
    }

    /// Commands in the last presented frame.
    #[must_use]
    pub const fn last_frame_len(&self) -> usize {
        self.last_frame_len
    }

    /// Events dropped because the queue was full.
    #[must_use]
    pub const fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// The audio output queue. Cloning it shares the samples.
    #[must_use]
    pub fn audio(&self) -> &AudioQueue {
        &self.audio
    }

    /// Sample rate of the open audio device.
    #[must_use]
    pub const fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn init(&mut self, width: usize, height: usize) -> BackendResult<()> {
        self.canvas = Some(Canvas::new(width, height)?);
        tracing::info!(width, height, "headless backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        self.canvas = None;
        self.sample_rate = None;
        self.audio.clear();
        tracing::info!(presented = self.presented, "headless backend shut down");
    }

    fn present(&mut self, frame: &Frame) {
        let Some(canvas) = self.canvas.as_mut() else {
            tracing::warn!("present before init, frame dropped");
            return;
        };
        canvas.draw(frame);
        self.presented += 1;
        self.last_frame_len = frame.len();
    }

    fn poll_input(&mut self, out: &mut Vec<Event>) {
        self.drain_events(out);
    }

    fn open_audio(&mut self, sample_rate: u32) -> BackendResult<()> {
        if self.sample_rate.is_some() {
            return Ok(());
        }
        if sample_rate == 0 {
            return Err(BackendError::InvalidSampleRate(sample_rate));
        }
        self.sample_rate = Some(sample_rate);
        tracing::debug!(sample_rate, "headless audio opened");
        Ok(())
    }

    fn trigger_sound(&mut self, id: u32, frequency: f32, duration: f32) {
        let rate = match self.sample_rate {
            Some(rate) => rate,
            None => {
                if let Err(err) = self.open_audio(DEFAULT_SAMPLE_RATE) {
                    tracing::warn!(%err, "failed to open audio");
                    return;
                }
                DEFAULT_SAMPLE_RATE
            }
        };

        let tone = synthesize_tone(frequency, duration, rate);
        if tone.is_empty() {
            return;
        }
        tracing::trace!(id, frequency, samples = tone.len(), "tone queued");
        self.audio.push(&tone);
    }

    fn try_pop_event(&mut self) -> Option<Event> {
        self.events.pop()
    }
}

impl std::fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessBackend")
            .field("canvas", &self.canvas)
            .field("queued_events", &self.events.len())
            .field("sample_rate", &self.sample_rate)
            .field("presented", &self.presented)
            .finish_non_exhaustive()
    }
}
