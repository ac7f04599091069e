//! # Tone Synthesis
//!
//! Mono `f32` sine tones with a short linear envelope, and the queue a
//! backend feeds them into for its audio device to drain.

use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::sync::Arc;

use parking_lot::Mutex;

/// Sample rate used when a sound is triggered before audio was opened.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Peak amplitude of a synthesized tone.
pub const TONE_AMPLITUDE: f32 = 0.25;

/// Linear fade-in length in seconds.
const ATTACK_SECS: f64 = 0.01;

/// Linear fade-out length in seconds.
const RELEASE_SECS: f64 = 0.05;

/// Number of samples in a tone of `duration` seconds.
///
/// Zero for non-positive or NaN durations.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tone_len(duration: f32, sample_rate: u32) -> usize {
    // `as` saturates: negative and NaN become 0.
    (f64::from(duration) * f64::from(sample_rate)) as usize
}

/// Synthesizes a sine tone.
///
/// Length is `duration * sample_rate` samples. The envelope ramps up over the
/// first 10 ms and down over the last 50 ms.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn synthesize_tone(frequency: f32, duration: f32, sample_rate: u32) -> Vec<f32> {
    let len = tone_len(duration, sample_rate);
    let rate = f64::from(sample_rate);
    let duration = f64::from(duration);
    let omega = TAU * f64::from(frequency);

    (0..len)
        .map(|i| {
            let t = i as f64 / rate;
            let envelope = if t < ATTACK_SECS {
                t / ATTACK_SECS
            } else if t > duration - RELEASE_SECS {
                (duration - t) / RELEASE_SECS
            } else {
                1.0
            };
            (f64::from(TONE_AMPLITUDE) * envelope.max(0.0) * (omega * t).sin()) as f32
        })
        .collect()
}

/// Samples waiting to be played.
///
/// Cloning shares the queue: the backend appends on the main thread while an
/// audio device callback drains from its own.
#[derive(Clone, Default)]
pub struct AudioQueue {
    samples: Arc<Mutex<VecDeque<f32>>>,
}

impl AudioQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends samples to the end of the queue.
    pub fn push(&self, samples: &[f32]) {
        self.samples.lock().extend(samples.iter().copied());
    }

    /// Moves up to `max` samples into `out`. Returns how many were moved.
    pub fn drain_into(&self, out: &mut Vec<f32>, max: usize) -> usize {
        let mut samples = self.samples.lock();
        let n = max.min(samples.len());
        out.extend(samples.drain(..n));
        n
    }

    /// Number of queued samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops everything queued.
    pub fn clear(&self) {
        self.samples.lock().clear();
    }
}

impl std::fmt::Debug for AudioQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioQueue").field("queued", &self.len()).finish()
    }
}
