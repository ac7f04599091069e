//! # Presentation Backends
//!
//! The contract between the runtime and whatever puts pixels on a screen,
//! reads input and plays sound.
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            │                 dyn Backend                  │
//!            ├──────────────────────┬───────────────────────┤
//!            │   HeadlessBackend    │      LogBackend       │
//!            │  Canvas + AudioQueue │  tracing only         │
//!            │  (tests, CI)         │  (embedded bring-up)  │
//!            └──────────────────────┴───────────────────────┘
//! ```
//!
//! The backend is chosen at startup from [`BackendKind`] with
//! [`create_backend`].

mod headless;
mod log;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackendResult;
use crate::events::Event;
use crate::Frame;

pub use headless::{HeadlessBackend, EVENT_QUEUE_SLOTS};
pub use log::LogBackend;

/// A presentation backend.
///
/// All methods are called from the runtime's thread. Object safe, so the
/// runtime can hold a `Box<dyn Backend>` picked at startup.
pub trait Backend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Prepares a `width` x `height` surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface can't be created.
    fn init(&mut self, width: usize, height: usize) -> BackendResult<()>;

    /// Releases everything `init` and `open_audio` acquired.
    fn shutdown(&mut self);

    /// Displays a decoded frame.
    fn present(&mut self, frame: &Frame);

    /// Collects pending input, appending it to `out` in arrival order.
    fn poll_input(&mut self, out: &mut Vec<Event>);

    /// Opens the audio device. Opening twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the device can't be opened at `sample_rate`.
    fn open_audio(&mut self, sample_rate: u32) -> BackendResult<()>;

    /// Plays a tone of `duration` seconds, opening audio on demand.
    fn trigger_sound(&mut self, id: u32, frequency: f32, duration: f32);

    /// Takes one queued event.
    fn try_pop_event(&mut self) -> Option<Event>;

    /// Moves every queued event into `out`.
    fn drain_events(&mut self, out: &mut Vec<Event>) {
        while let Some(event) = self.try_pop_event() {
            out.push(event);
        }
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn init(&mut self, width: usize, height: usize) -> BackendResult<()> {
        (**self).init(width, height)
    }

    fn shutdown(&mut self) {
        (**self).shutdown();
    }

    fn present(&mut self, frame: &Frame) {
        (**self).present(frame);
    }

    fn poll_input(&mut self, out: &mut Vec<Event>) {
        (**self).poll_input(out);
    }

    fn open_audio(&mut self, sample_rate: u32) -> BackendResult<()> {
        (**self).open_audio(sample_rate)
    }

    fn trigger_sound(&mut self, id: u32, frequency: f32, duration: f32) {
        (**self).trigger_sound(id, frequency, duration);
    }

    fn try_pop_event(&mut self) -> Option<Event> {
        (**self).try_pop_event()
    }

    fn drain_events(&mut self, out: &mut Vec<Event>) {
        (**self).drain_events(out);
    }
}

/// Backends selectable at runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// [`HeadlessBackend`].
    #[default]
    Headless,
    /// [`LogBackend`].
    Log,
}

impl BackendKind {
    /// Config / command line spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Headless => "headless",
            Self::Log => "log",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "headless" => Ok(Self::Headless),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown backend {other:?} (expected \"headless\" or \"log\")")),
        }
    }
}

/// Creates the backend for `kind`, uninitialized.
#[must_use]
pub fn create_backend(kind: BackendKind) -> Box<dyn Backend> {
    tracing::debug!(backend = %kind, "creating backend");
    match kind {
        BackendKind::Headless => Box::new(HeadlessBackend::new()),
        BackendKind::Log => Box::new(LogBackend::new()),
    }
}
