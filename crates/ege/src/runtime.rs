//! # EGE Runtime
//!
//! One loop drives everything:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. INPUT                                                            │
//! │    ├─ backend.poll_input + drain_events                             │
//! │    ├─ dispatch to layers, top first                                 │
//! │    └─ Quit stops the loop, Sound plays (unless a layer took them)   │
//! │                                                                     │
//! │ 2. UPDATE                                                           │
//! │    └─ layers.on_update(dt), bottom first                            │
//! │                                                                     │
//! │ 3. RECORD (producer)                                                │
//! │    ├─ begin_frame (skipped when every buffer is in flight)          │
//! │    ├─ layers.on_render into the command buffer + scratch arena      │
//! │    └─ submit_frame                                                  │
//! │                                                                     │
//! │ 4. PRESENT (consumer)                                               │
//! │    ├─ consume_and_decode the oldest ready frame                     │
//! │    └─ backend.present                                               │
//! │                                                                     │
//! │ 5. END FRAME                                                        │
//! │    └─ record timings, sleep out the frame budget                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lifecycle: [`Runtime::init`] → [`Runtime::run`] (or repeated
//! [`Runtime::step`]) → [`Runtime::teardown`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ege_core::{FrameConsumer, FrameProducer, PipelineStats, StaticArena};

use crate::backend::{create_backend, Backend};
use crate::config::RuntimeConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::events::Event;
use crate::layer::{Layer, LayerStack, RenderContext};
use crate::{EnginePipeline, Frame, COMMAND_BUFFER_BYTES};

/// Step used for the first frame, before there is a previous one to measure.
const FIRST_FRAME_DT: f32 = 1.0 / 60.0;

/// Longest step handed to layers, so a stall doesn't explode the simulation.
const MAX_DT: f32 = 0.1;

/// Cooperative stop signal for [`Runtime::run`].
///
/// Cheap to clone; any clone can stop the loop from any thread. The loop
/// notices at the start of its next frame.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the loop to stop.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Returns true once `stop` was called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.stopped.store(false, Ordering::Release);
    }
}

/// Timings and counts of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Whole step in microseconds, pacing sleep excluded.
    pub total_us: u64,
    /// Input polling and dispatch in microseconds.
    pub input_us: u64,
    /// Layer update in microseconds.
    pub update_us: u64,
    /// Recording in microseconds.
    pub record_us: u64,
    /// Decode and present in microseconds.
    pub present_us: u64,
    /// Events processed.
    pub events: u32,
    /// Encoded bytes recorded.
    pub recorded_bytes: u32,
    /// Commands presented.
    pub commands: u32,
    /// False if no buffer was free to record into.
    pub recorded: bool,
    /// True if a frame reached the backend.
    pub presented: bool,
}

/// Running totals of [`FrameStats`].
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Frames recorded.
    pub frames: u64,
    /// Sum of total step times.
    pub total_us_sum: u64,
    /// Sum of record times.
    pub record_us_sum: u64,
    /// Sum of present times.
    pub present_us_sum: u64,
    /// Fastest step.
    pub min_frame_us: u64,
    /// Slowest step.
    pub max_frame_us: u64,
    /// Steps slower than the budget.
    pub frames_over_budget: u64,
    /// Steps that could not record.
    pub frames_skipped: u64,
    /// Frames that reached the backend.
    pub frames_presented: u64,
    /// Commands presented in total.
    pub commands_presented: u64,
    budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator that counts steps longer than `budget`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(budget: Duration) -> Self {
        Self {
            frames: 0,
            total_us_sum: 0,
            record_us_sum: 0,
            present_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            frames_skipped: 0,
            frames_presented: 0,
            commands_presented: 0,
            budget_us: budget.as_micros() as u64,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames += 1;
        self.total_us_sum += stats.total_us;
        self.record_us_sum += stats.record_us;
        self.present_us_sum += stats.present_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
        if !stats.recorded {
            self.frames_skipped += 1;
        }
        if stats.presented {
            self.frames_presented += 1;
            self.commands_presented += u64::from(stats.commands);
        }
    }

    /// Returns average step time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames as f64) / 1000.0
    }

    /// Returns the step rate the loop could sustain unpaced.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of steps over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames as f64
    }

    /// Logs a summary at info level.
    #[allow(clippy::cast_precision_loss)]
    pub fn log_summary(&self) {
        if self.frames == 0 {
            tracing::info!("no frames recorded");
            return;
        }
        tracing::info!(
            frames = self.frames,
            presented = self.frames_presented,
            skipped = self.frames_skipped,
            commands = self.commands_presented,
            avg_ms = format_args!("{:.3}", self.avg_frame_ms()),
            min_ms = format_args!("{:.3}", self.min_frame_us as f64 / 1000.0),
            max_ms = format_args!("{:.3}", self.max_frame_us as f64 / 1000.0),
            over_budget = format_args!("{:.1}%", self.over_budget_ratio() * 100.0),
            "frame statistics"
        );
    }
}

/// Where a runtime is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Created,
    Initialized,
    TornDown,
}

/// Drives a backend, a layer stack and the frame pipeline.
///
/// Single-threaded: both pipeline roles are held here and the frame
/// recorded in a step is presented in the same step.
///
/// ## Usage
///
/// ```rust
/// use ege::{HeadlessBackend, Runtime, RuntimeConfig};
///
/// let config = RuntimeConfig { target_fps: 0, max_frames: Some(3), ..Default::default() };
/// let mut runtime = Runtime::new(config, HeadlessBackend::new()).unwrap();
/// runtime.init().unwrap();
/// runtime.run().unwrap();
/// runtime.teardown();
/// assert_eq!(runtime.backend().presented(), 3);
/// ```
pub struct Runtime<B: Backend = Box<dyn Backend>> {
    config: RuntimeConfig,
    backend: B,
    layers: LayerStack,
    producer: FrameProducer<COMMAND_BUFFER_BYTES>,
    consumer: FrameConsumer<COMMAND_BUFFER_BYTES>,
    /// Decode target. Boxed: it is the largest thing the runtime owns.
    frame: Box<Frame>,
    /// Backing memory of the per-frame scratch arena.
    scratch: Vec<u8>,
    /// Reused input buffer.
    events: Vec<Event>,
    state: State,
    stop: StopHandle,
    frame_count: u64,
    last_step: Option<Instant>,
    stats: FrameStatsAccumulator,
}

impl Runtime {
    /// Creates a runtime with the backend named in `config`.
    ///
    /// # Errors
    ///
    /// As [`Runtime::new`].
    pub fn from_config(config: RuntimeConfig) -> RuntimeResult<Self> {
        let backend = create_backend(config.backend);
        Self::new(config, backend)
    }
}

impl<B: Backend> Runtime<B> {
    /// Creates a runtime around `backend`. Nothing is initialized yet.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Config`] if `config` fails validation.
    pub fn new(config: RuntimeConfig, backend: B) -> RuntimeResult<Self> {
        config.validate()?;

        let pipeline = EnginePipeline::new();
        let producer = pipeline
            .producer()
            .ok_or(RuntimeError::PipelineClaimed("producer"))?;
        let consumer = pipeline
            .consumer()
            .ok_or(RuntimeError::PipelineClaimed("consumer"))?;

        let budget = config
            .frame_time()
            .unwrap_or_else(|| config.slow_frame_threshold());

        Ok(Self {
            scratch: vec![0; config.scratch_bytes],
            stats: FrameStatsAccumulator::new(budget),
            config,
            backend,
            layers: LayerStack::new(),
            producer,
            consumer,
            frame: Box::default(),
            events: Vec::with_capacity(64),
            state: State::Created,
            stop: StopHandle::default(),
            frame_count: 0,
            last_step: None,
        })
    }

    /// Pushes a layer on top of the stack.
    pub fn push_layer(&mut self, layer: impl Layer + 'static) {
        self.layers.push(Box::new(layer));
    }

    /// Initializes the backend, and audio if enabled.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Backend`] if the backend fails; the runtime stays
    /// uninitialized.
    pub fn init(&mut self) -> RuntimeResult<()> {
        if self.state == State::Initialized {
            return Ok(());
        }

        self.backend.init(self.config.width, self.config.height)?;
        if self.config.audio {
            if let Err(err) = self.backend.open_audio(self.config.sample_rate) {
                self.backend.shutdown();
                return Err(err.into());
            }
        }

        self.state = State::Initialized;
        self.stop.reset();
        tracing::info!(
            backend = self.backend.name(),
            width = self.config.width,
            height = self.config.height,
            target_fps = self.config.target_fps,
            layers = self.layers.len(),
            "runtime initialized"
        );
        Ok(())
    }

    /// A handle that stops [`run`](Self::run) from anywhere.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs frames until stopped, a quit event arrives or `max_frames` is
    /// reached. Returns the number of frames run by this call.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NotInitialized`] if called before `init`.
    pub fn run(&mut self) -> RuntimeResult<u64> {
        self.ensure_initialized()?;
        let frame_time = self.config.frame_time();
        let start_frame = self.frame_count;
        tracing::info!("runtime loop started");

        while !self.stop.is_stopped() {
            if self
                .config
                .max_frames
                .is_some_and(|max| self.frame_count >= max)
            {
                break;
            }

            let started = Instant::now();
            self.step()?;

            if let Some(budget) = frame_time {
                if let Some(rest) = budget.checked_sub(started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        }

        let frames = self.frame_count - start_frame;
        tracing::info!(frames, "runtime loop finished");
        Ok(frames)
    }

    /// Runs exactly one frame.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::NotInitialized`] if called before `init`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn step(&mut self) -> RuntimeResult<FrameStats> {
        self.ensure_initialized()?;

        let started = Instant::now();
        let dt = self.next_dt(started);
        let mut stats = FrameStats {
            frame: self.frame_count,
            ..FrameStats::default()
        };

        // 1. Input
        stats.events = self.process_input() as u32;
        let input_done = Instant::now();

        // 2. Update
        self.layers.update(dt);
        let update_done = Instant::now();

        // 3. Record
        if let Some(commands) = self.producer.begin_frame() {
            let scratch = StaticArena::new(&mut self.scratch);
            let mut ctx = RenderContext {
                commands,
                frame: self.frame_count,
                scratch: &scratch,
            };
            self.layers.render(&mut ctx);
            stats.recorded_bytes = ctx.commands.len() as u32;
            stats.recorded = self.producer.submit_frame();
        } else {
            tracing::debug!(frame = self.frame_count, "no free command buffer, frame skipped");
        }
        let record_done = Instant::now();

        // 4. Present
        if self.consumer.consume_and_decode(&mut *self.frame) {
            self.backend.present(&self.frame);
            stats.presented = true;
            stats.commands = self.frame.len() as u32;
        }
        let present_done = Instant::now();

        // 5. End frame
        stats.input_us = micros(input_done - started);
        stats.update_us = micros(update_done - input_done);
        stats.record_us = micros(record_done - update_done);
        stats.present_us = micros(present_done - record_done);
        stats.total_us = micros(present_done - started);

        self.stats.record(&stats);
        self.frame_count += 1;

        if present_done - started > self.config.slow_frame_threshold() {
            tracing::warn!(
                frame = stats.frame,
                ms = format_args!("{:.2}", stats.total_us as f64 / 1000.0),
                budget_ms = self.config.slow_frame_ms,
                "frame exceeded budget"
            );
        }

        Ok(stats)
    }

    /// Runs `on_exit` on every layer, shuts the backend down and logs the
    /// statistics. Safe to call more than once; later calls do nothing.
    pub fn teardown(&mut self) {
        if self.state == State::TornDown {
            return;
        }
        self.layers.exit();
        if self.state == State::Initialized {
            self.backend.shutdown();
        }
        self.state = State::TornDown;
        self.stats.log_summary();
        tracing::info!(pipeline = ?self.pipeline_stats(), "runtime torn down");
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The configuration the runtime was built with.
    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably (e.g. to inject input into a headless backend).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The layer stack.
    #[must_use]
    pub const fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// The last decoded frame.
    #[must_use]
    pub fn last_frame(&self) -> &Frame {
        &self.frame
    }

    /// Accumulated frame statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// Hand-off counters of the frame pipeline.
    #[must_use]
    pub fn pipeline_stats(&self) -> PipelineStats {
        self.producer.pipeline().stats()
    }

    fn ensure_initialized(&self) -> RuntimeResult<()> {
        match self.state {
            State::Initialized => Ok(()),
            State::Created | State::TornDown => Err(RuntimeError::NotInitialized),
        }
    }

    fn next_dt(&mut self, now: Instant) -> f32 {
        let dt = self
            .last_step
            .map_or(FIRST_FRAME_DT, |last| now.duration_since(last).as_secs_f32());
        self.last_step = Some(now);
        dt.min(MAX_DT)
    }

    /// Polls, dispatches and acts on input. Returns the number of events.
    fn process_input(&mut self) -> usize {
        self.events.clear();
        self.backend.poll_input(&mut self.events);
        self.backend.drain_events(&mut self.events);

        for event in &self.events {
            if self.layers.dispatch(event) {
                continue;
            }
            if event.is_shutdown() {
                tracing::info!(frame = self.frame_count, "quit requested");
                self.stop.stop();
            } else if let Event::Sound { id, frequency, duration } = *event {
                if self.config.audio {
                    self.backend.trigger_sound(id, frequency, duration);
                }
            }
        }
        self.events.len()
    }
}

impl<B: Backend> std::fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("frame_count", &self.frame_count)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn micros(duration: Duration) -> u64 {
    duration.as_micros() as u64
}

impl<B: Backend> Drop for Runtime<B> {
    fn drop(&mut self) {
        if self.state == State::Initialized {
            self.teardown();
        }
    }
}
